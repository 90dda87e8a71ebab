//! Billing / Checkout Engine
//!
//! 结账是协议里唯一的多表聚合写：把当前占用窗口内的全部订单
//! 聚合成一张账单，订单置 `served`，桌台收尾并推进窗口边界。
//! 整个过程在一个事务内，第一条语句就写桌台行拿写锁，并发结账
//! 天然串行化（后到的拿锁失败以 SQLITE_BUSY 浮出，映射为可重试
//! 的 Conflict）。

use std::sync::Arc;

use sqlx::SqlitePool;

use shared::models::{
    Bill, CheckoutSummary, DiningTable, Order, OrderStatus, PaymentMethod, TableStatus,
};
use shared::util;
use shared::{DomainEvent, Topic};

use crate::db::repository::bill::{BILL_SELECT, BillRow};
use crate::db::repository::dining_table::TABLE_SELECT;
use crate::db::repository::order::ORDER_SELECT;
use crate::money;
use crate::notify::EventSink;
use crate::utils::{AppError, AppResult};

pub struct CheckoutEngine {
    pool: SqlitePool,
    events: Arc<dyn EventSink>,
}

impl CheckoutEngine {
    pub fn new(pool: SqlitePool, events: Arc<dyn EventSink>) -> Self {
        Self { pool, events }
    }

    /// 结账：聚合窗口内订单 → 账单，订单置 `served`，桌台释放，
    /// 窗口边界严格前移。
    ///
    /// 同一窗口内已存在账单时就地更新（同一账单 ID），不会产生
    /// 重复账单。
    pub async fn checkout(
        &self,
        table_id: i64,
        payment_method: PaymentMethod,
    ) -> AppResult<CheckoutSummary> {
        if !payment_method.is_checkout_method() {
            return Err(AppError::invalid(format!(
                "Payment method {payment_method} is not accepted at checkout"
            )));
        }

        let mut tx = self.pool.begin().await?;

        // Touch the table row first: takes the write lock, serializing
        // concurrent checkouts of the same table
        let touched = sqlx::query("UPDATE dining_table SET status = status WHERE id = ?")
            .bind(table_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Table {table_id} not found")));
        }

        let table_sql = format!("{TABLE_SELECT} WHERE id = ?");
        let table = sqlx::query_as::<_, DiningTable>(&table_sql)
            .bind(table_id)
            .fetch_one(&mut *tx)
            .await?;

        let orders_sql = format!(
            "{ORDER_SELECT} WHERE table_id = ?1 AND order_time > ?2 \
             AND status != 'cancelled' ORDER BY order_time"
        );
        let orders = sqlx::query_as::<_, Order>(&orders_sql)
            .bind(table_id)
            .bind(table.last_cleared_at)
            .fetch_all(&mut *tx)
            .await?;
        if orders.is_empty() {
            // Transaction dropped, nothing written
            return Err(AppError::not_found(format!(
                "Nothing to bill for table {}",
                table.number
            )));
        }

        let total_amount = money::sum(orders.iter().map(|o| o.total_amount));
        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let order_ids_json = serde_json::to_string(&order_ids)
            .map_err(|e| AppError::internal(format!("Failed to encode order ids: {e}")))?;

        let now = util::now_millis();

        // Idempotent within the window: a bill already created since the
        // last clear is updated in place instead of duplicated
        let existing_sql = format!(
            "{BILL_SELECT} WHERE table_id = ?1 AND created_at > ?2 \
             ORDER BY created_at DESC LIMIT 1"
        );
        let existing = sqlx::query_as::<_, BillRow>(&existing_sql)
            .bind(table_id)
            .bind(table.last_cleared_at)
            .fetch_optional(&mut *tx)
            .await?;

        let (bill_id, created_at) = match &existing {
            Some(row) => {
                sqlx::query(
                    "UPDATE bill SET total_amount = ?1, order_ids = ?2, \
                         payment_method = ?3, payment_time = ?4 \
                     WHERE id = ?5",
                )
                .bind(total_amount)
                .bind(&order_ids_json)
                .bind(payment_method)
                .bind(now)
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
                (row.id, row.created_at)
            }
            None => {
                let id = util::snowflake_id();
                sqlx::query(
                    "INSERT INTO bill (id, table_id, total_amount, order_ids, \
                         payment_method, payment_time, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                )
                .bind(id)
                .bind(table_id)
                .bind(total_amount)
                .bind(&order_ids_json)
                .bind(payment_method)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                (id, now)
            }
        };

        // Bare `?` only: mixing `?N` with `?` misaligns sqlx's positional binds
        let placeholders = vec!["?"; order_ids.len()].join(", ");
        let served_sql =
            format!("UPDATE customer_order SET status = ? WHERE id IN ({placeholders})");
        let mut served = sqlx::query(&served_sql).bind(OrderStatus::Served);
        for id in &order_ids {
            served = served.bind(id);
        }
        served.execute(&mut *tx).await?;

        // Strictly greater than the previous boundary even within one ms
        let new_marker = now.max(table.last_cleared_at + 1);
        sqlx::query("UPDATE dining_table SET status = ?1, last_cleared_at = ?2 WHERE id = ?3")
            .bind(TableStatus::Available)
            .bind(new_marker)
            .bind(table_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let orders_billed = order_ids.len() as u32;
        let timestamp = util::now_rfc3339();
        self.events.publish(
            Topic::Dashboard,
            DomainEvent::TableStatusChanged {
                table_id,
                status: TableStatus::Available,
                timestamp: timestamp.clone(),
            },
        );
        self.events.publish(
            Topic::Dashboard,
            DomainEvent::TableCheckedOut {
                table_id,
                bill_id,
                total_amount,
                orders_billed,
                timestamp: timestamp.clone(),
            },
        );
        self.events.publish(
            Topic::Table(table_id),
            DomainEvent::BillCreated {
                bill_id,
                table_id,
                total_amount,
                timestamp,
            },
        );

        Ok(CheckoutSummary {
            bill: Bill {
                id: bill_id,
                table_id,
                total_amount,
                order_ids,
                payment_method,
                payment_time: now,
                created_at,
            },
            table: DiningTable {
                status: TableStatus::Available,
                last_cleared_at: new_marker,
                ..table
            },
            orders_billed,
        })
    }

    /// 管理操作：重置窗口边界（翻台），不触碰任何订单。
    pub async fn clear_marker(&self, table_id: i64) -> AppResult<DiningTable> {
        let now = util::now_millis();
        let rows = sqlx::query(
            "UPDATE dining_table SET status = ?1, \
                 last_cleared_at = max(?2, last_cleared_at + 1) \
             WHERE id = ?3",
        )
        .bind(TableStatus::Available)
        .bind(now)
        .bind(table_id)
        .execute(&self.pool)
        .await?;
        if rows.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Table {table_id} not found")));
        }

        let table_sql = format!("{TABLE_SELECT} WHERE id = ?");
        let table = sqlx::query_as::<_, DiningTable>(&table_sql)
            .bind(table_id)
            .fetch_one(&self.pool)
            .await?;

        self.events.publish(
            Topic::Dashboard,
            DomainEvent::TableStatusChanged {
                table_id,
                status: TableStatus::Available,
                timestamp: util::now_rfc3339(),
            },
        );

        Ok(table)
    }
}
