//! 业务引擎
//!
//! 订单、结账、呼叫三个引擎共享同一套持久化状态（桌台、订单、账单）
//! 和同一个事件出口，构成桌台计费协议的全部写路径：
//!
//! - [`order_lifecycle`] — 订单创建/推进/取消，维护桌台占用状态
//! - [`checkout`] — 把一个占用窗口内的订单聚合成账单并收尾
//! - [`staff_call`] — 只读的买单预览 + 呼叫事件
//!
//! 引擎自持事务（多行写必须原子），简单读取复用
//! [`crate::db::repository`]。事件一律在事务提交之后发布。

pub mod checkout;
pub mod order_lifecycle;
pub mod staff_call;

pub use checkout::CheckoutEngine;
pub use order_lifecycle::OrderLifecycle;
pub use staff_call::StaffCall;

#[cfg(test)]
pub(crate) mod test_support {
    use shared::models::{DiningTableCreate, MenuItemCreate};
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::db::repository::{dining_table, menu_item};

    /// In-memory pool with the real schema applied.
    ///
    /// max_connections(1): 每个 `sqlite::memory:` 连接是独立数据库，
    /// 测试必须钉在同一个连接上。
    pub async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON;")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    pub async fn seed_table(pool: &SqlitePool, number: i32) -> i64 {
        dining_table::create(
            pool,
            DiningTableCreate {
                number,
                seats: Some(4),
                qr_code: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    pub async fn seed_menu_item(pool: &SqlitePool, name: &str, price: f64) -> i64 {
        menu_item::create(
            pool,
            MenuItemCreate {
                name: name.into(),
                price,
                category: None,
                is_available: None,
            },
        )
        .await
        .unwrap()
        .id
    }
}
