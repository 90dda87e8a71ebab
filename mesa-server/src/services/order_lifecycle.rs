//! Order Lifecycle Engine
//!
//! 订单从创建到终态的唯一写入口。每个多行写都在一个事务里：
//! 订单头 + 订单行 + 桌台占用状态要么全部落库，要么全不落库。
//! 事件在提交之后发布。

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::SqlitePool;

use shared::models::{
    DiningTable, MenuItem, Order, OrderCreate, OrderItem, OrderStatus, OrderUpdate,
    OrderWithItems, TableStatus,
};
use shared::util;
use shared::{DomainEvent, Topic};

use crate::db::repository::dining_table::TABLE_SELECT;
use crate::db::repository::menu_item::MENU_SELECT;
use crate::db::repository::order::ORDER_SELECT;
use crate::money;
use crate::notify::EventSink;
use crate::utils::{AppError, AppResult};

pub struct OrderLifecycle {
    pool: SqlitePool,
    events: Arc<dyn EventSink>,
}

impl OrderLifecycle {
    pub fn new(pool: SqlitePool, events: Arc<dyn EventSink>) -> Self {
        Self { pool, events }
    }

    /// 创建订单（一次顾客购物车提交）。
    ///
    /// 校验菜单项、快照名称和单价、计算总额、写入订单头和订单行，
    /// 并把桌台翻到 `occupied`，全部在同一事务内完成。
    pub async fn create(&self, data: OrderCreate) -> AppResult<OrderWithItems> {
        if data.items.is_empty() {
            return Err(AppError::validation("Order must contain at least one item"));
        }
        if let Some(bad) = data.items.iter().find(|i| i.quantity < 1) {
            return Err(AppError::validation(format!(
                "Invalid quantity {} for menu item {}",
                bad.quantity, bad.menu_item_id
            )));
        }

        let mut tx = self.pool.begin().await?;

        let table_sql = format!("{TABLE_SELECT} WHERE id = ?");
        let table = sqlx::query_as::<_, DiningTable>(&table_sql)
            .bind(data.table_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Table {} not found", data.table_id)))?;

        let order_id = util::snowflake_id();
        // Clamp past the window boundary: an order racing a same-millisecond
        // checkout must stay billable in the next window, never land exactly
        // on the marker
        let order_time = util::now_millis().max(table.last_cleared_at + 1);
        let menu_sql = format!("{MENU_SELECT} WHERE id = ?");

        let mut total = Decimal::ZERO;
        let mut items = Vec::with_capacity(data.items.len());
        for line in &data.items {
            let menu_item = sqlx::query_as::<_, MenuItem>(&menu_sql)
                .bind(line.menu_item_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!("Menu item {} not found", line.menu_item_id))
                })?;
            if !menu_item.is_available {
                return Err(AppError::validation(format!(
                    "Menu item '{}' is not available",
                    menu_item.name
                )));
            }
            total += money::item_total(menu_item.price, line.quantity);
            items.push(OrderItem {
                id: util::snowflake_id(),
                order_id,
                menu_item_id: menu_item.id,
                // Snapshot: later catalog edits must not rewrite history
                name: menu_item.name,
                price: menu_item.price,
                quantity: line.quantity,
                note: line.note.clone(),
            });
        }

        let total_amount = money::to_f64(total);
        sqlx::query(
            "INSERT INTO customer_order (id, table_id, total_amount, status, order_time, customer_name, note) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(order_id)
        .bind(data.table_id)
        .bind(total_amount)
        .bind(OrderStatus::New)
        .bind(order_time)
        .bind(&data.customer_name)
        .bind(&data.note)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                "INSERT INTO order_item (id, order_id, menu_item_id, name, price, quantity, note) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(item.id)
            .bind(item.order_id)
            .bind(item.menu_item_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.quantity)
            .bind(&item.note)
            .execute(&mut *tx)
            .await?;
        }

        let table_flipped = table.status != TableStatus::Occupied;
        if table_flipped {
            sqlx::query("UPDATE dining_table SET status = ?1 WHERE id = ?2")
                .bind(TableStatus::Occupied)
                .bind(data.table_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let timestamp = util::now_rfc3339();
        self.events.publish(
            Topic::Dashboard,
            DomainEvent::NewOrder {
                order_id,
                table_id: data.table_id,
                total_amount,
                timestamp: timestamp.clone(),
            },
        );
        self.events.publish(
            Topic::Table(data.table_id),
            DomainEvent::OrderStatusUpdated {
                order_id,
                table_id: data.table_id,
                status: OrderStatus::New,
                timestamp: timestamp.clone(),
            },
        );
        if table_flipped {
            self.events.publish(
                Topic::Dashboard,
                DomainEvent::TableStatusChanged {
                    table_id: data.table_id,
                    status: TableStatus::Occupied,
                    timestamp,
                },
            );
        }

        let order = Order {
            id: order_id,
            table_id: data.table_id,
            total_amount,
            status: OrderStatus::New,
            order_time,
            customer_name: data.customer_name,
            note: data.note,
        };
        Ok(OrderWithItems { order, items })
    }

    /// 推进订单状态和/或修改备注。
    ///
    /// 状态必须沿状态机前进；订单到达 `served` 时桌台翻回
    /// `available`（同一事务）。
    pub async fn update(&self, order_id: i64, data: OrderUpdate) -> AppResult<Order> {
        if data.status.is_none() && data.note.is_none() {
            return Err(AppError::invalid("Either status or note is required"));
        }

        let mut tx = self.pool.begin().await?;

        let order_sql = format!("{ORDER_SELECT} WHERE id = ?");
        let order = sqlx::query_as::<_, Order>(&order_sql)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;

        if order.status.is_terminal() {
            return Err(AppError::invalid(format!(
                "Order {order_id} is {} and can no longer be modified",
                order.status
            )));
        }
        if let Some(next) = data.status
            && !order.status.can_transition_to(next)
        {
            return Err(AppError::invalid(format!(
                "Illegal status transition: {} -> {next}",
                order.status
            )));
        }

        sqlx::query(
            "UPDATE customer_order SET \
                 status = COALESCE(?1, status), \
                 note = COALESCE(?2, note) \
             WHERE id = ?3",
        )
        .bind(data.status)
        .bind(&data.note)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        let new_status = data.status.unwrap_or(order.status);
        let table_flipped = new_status == OrderStatus::Served && order.status != OrderStatus::Served;
        if table_flipped {
            sqlx::query("UPDATE dining_table SET status = ?1 WHERE id = ?2")
                .bind(TableStatus::Available)
                .bind(order.table_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let timestamp = util::now_rfc3339();
        self.events.publish(
            Topic::Dashboard,
            DomainEvent::OrderStatusChanged {
                order_id,
                table_id: order.table_id,
                status: new_status,
                timestamp: timestamp.clone(),
            },
        );
        self.events.publish(
            Topic::Table(order.table_id),
            DomainEvent::OrderStatusUpdated {
                order_id,
                table_id: order.table_id,
                status: new_status,
                timestamp: timestamp.clone(),
            },
        );
        if table_flipped {
            self.events.publish(
                Topic::Dashboard,
                DomainEvent::TableStatusChanged {
                    table_id: order.table_id,
                    status: TableStatus::Available,
                    timestamp,
                },
            );
        }

        let mut updated = order;
        updated.status = new_status;
        if let Some(note) = data.note {
            updated.note = Some(note);
        }
        Ok(updated)
    }

    /// 删除订单（撤单）。
    ///
    /// 桌台占用状态按剩余未结窗口内订单重新计算，而不是无条件
    /// 置为 `available`，避免误清仍有在做订单的桌台。
    pub async fn delete(&self, order_id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let order_sql = format!("{ORDER_SELECT} WHERE id = ?");
        let order = sqlx::query_as::<_, Order>(&order_sql)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;

        let table_sql = format!("{TABLE_SELECT} WHERE id = ?");
        let table = sqlx::query_as::<_, DiningTable>(&table_sql)
            .bind(order.table_id)
            .fetch_optional(&mut *tx)
            .await?;

        // order_item rows go with the order (ON DELETE CASCADE)
        sqlx::query("DELETE FROM customer_order WHERE id = ?")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        let mut table_flipped = false;
        if let Some(table) = &table
            && table.status == TableStatus::Occupied
        {
            let (remaining,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM customer_order \
                 WHERE table_id = ?1 AND order_time > ?2 \
                   AND status IN ('new', 'preparing', 'ready')",
            )
            .bind(order.table_id)
            .bind(table.last_cleared_at)
            .fetch_one(&mut *tx)
            .await?;
            if remaining == 0 {
                sqlx::query("UPDATE dining_table SET status = ?1 WHERE id = ?2")
                    .bind(TableStatus::Available)
                    .bind(order.table_id)
                    .execute(&mut *tx)
                    .await?;
                table_flipped = true;
            }
        }

        tx.commit().await?;

        let timestamp = util::now_rfc3339();
        self.events.publish(
            Topic::Dashboard,
            DomainEvent::OrderStatusChanged {
                order_id,
                table_id: order.table_id,
                status: OrderStatus::Cancelled,
                timestamp: timestamp.clone(),
            },
        );
        self.events.publish(
            Topic::Table(order.table_id),
            DomainEvent::OrderStatusUpdated {
                order_id,
                table_id: order.table_id,
                status: OrderStatus::Cancelled,
                timestamp: timestamp.clone(),
            },
        );
        if table_flipped {
            self.events.publish(
                Topic::Dashboard,
                DomainEvent::TableStatusChanged {
                    table_id: order.table_id,
                    status: TableStatus::Available,
                    timestamp,
                },
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{dining_table, order};
    use crate::notify::NoopSink;
    use crate::services::test_support::{seed_menu_item, seed_table, test_pool};
    use shared::models::OrderItemCreate;

    fn engine(pool: &SqlitePool) -> OrderLifecycle {
        OrderLifecycle::new(pool.clone(), Arc::new(NoopSink))
    }

    fn cart(table_id: i64, lines: Vec<(i64, i32)>) -> OrderCreate {
        OrderCreate {
            table_id,
            items: lines
                .into_iter()
                .map(|(menu_item_id, quantity)| OrderItemCreate {
                    menu_item_id,
                    quantity,
                    note: None,
                })
                .collect(),
            customer_name: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn create_computes_total_and_snapshots_prices() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 1).await;
        let noodles = seed_menu_item(&pool, "Noodles", 12.5).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;

        let created = engine(&pool)
            .create(cart(table_id, vec![(noodles, 2), (tea, 1)]))
            .await
            .unwrap();

        assert_eq!(created.order.total_amount, 28.0);
        assert_eq!(created.order.status, OrderStatus::New);
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[0].name, "Noodles");
        assert_eq!(created.items[0].price, 12.5);

        // Later price change must not affect the stored snapshot
        crate::db::repository::menu_item::update(
            &pool,
            noodles,
            shared::models::MenuItemUpdate {
                name: None,
                price: Some(99.0),
                category: None,
                is_available: None,
            },
        )
        .await
        .unwrap();
        let reloaded = order::find_by_id_with_items(&pool, created.order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.items[0].price, 12.5);
        assert_eq!(reloaded.order.total_amount, 28.0);
    }

    #[tokio::test]
    async fn order_racing_a_clear_lands_in_the_next_window() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 12).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;

        // Marker at (or slightly past) this very millisecond, as a
        // concurrent checkout would leave it
        sqlx::query("UPDATE dining_table SET last_cleared_at = ?1 WHERE id = ?2")
            .bind(shared::util::now_millis() + 5)
            .bind(table_id)
            .execute(&pool)
            .await
            .unwrap();

        let created = engine(&pool)
            .create(cart(table_id, vec![(tea, 1)]))
            .await
            .unwrap();

        let table = dining_table::find_by_id(&pool, table_id)
            .await
            .unwrap()
            .unwrap();
        assert!(created.order.order_time > table.last_cleared_at);

        // Billable by the next checkout, not stranded behind the marker
        let summary = crate::services::CheckoutEngine::new(pool.clone(), Arc::new(NoopSink))
            .checkout(table_id, shared::models::PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(summary.bill.order_ids, vec![created.order.id]);
    }

    #[tokio::test]
    async fn create_occupies_table() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 2).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;

        engine(&pool)
            .create(cart(table_id, vec![(tea, 1)]))
            .await
            .unwrap();

        let table = dining_table::find_by_id(&pool, table_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(table.status, TableStatus::Occupied);
    }

    #[tokio::test]
    async fn create_rejects_empty_cart_and_bad_quantity() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 3).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;

        let err = engine(&pool).create(cart(table_id, vec![])).await;
        assert!(matches!(err, Err(AppError::Validation(_))));

        let err = engine(&pool).create(cart(table_id, vec![(tea, 0)])).await;
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_with_unknown_menu_item_writes_nothing() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 4).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;

        let err = engine(&pool)
            .create(cart(table_id, vec![(tea, 1), (999, 1)]))
            .await;
        assert!(matches!(err, Err(AppError::NotFound(_))));

        // Whole transaction rolled back: no partial order, table untouched
        assert!(order::find_all(&pool).await.unwrap().is_empty());
        let table = dining_table::find_by_id(&pool, table_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(table.status, TableStatus::Available);
    }

    #[tokio::test]
    async fn create_rejects_unavailable_menu_item() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 5).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;
        crate::db::repository::menu_item::delete(&pool, tea)
            .await
            .unwrap();

        let err = engine(&pool).create(cart(table_id, vec![(tea, 1)])).await;
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_for_unknown_table_is_not_found() {
        let pool = test_pool().await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;

        let err = engine(&pool).create(cart(12345, vec![(tea, 1)])).await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_walks_the_state_machine() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 6).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;
        let svc = engine(&pool);
        let created = svc.create(cart(table_id, vec![(tea, 1)])).await.unwrap();
        let id = created.order.id;

        let set = |status| OrderUpdate {
            status: Some(status),
            note: None,
        };

        let updated = svc.update(id, set(OrderStatus::Preparing)).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Preparing);
        svc.update(id, set(OrderStatus::Ready)).await.unwrap();
        svc.update(id, set(OrderStatus::Served)).await.unwrap();

        let stored = order::find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Served);
    }

    #[tokio::test]
    async fn update_rejects_backward_and_terminal_transitions() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 7).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;
        let svc = engine(&pool);
        let id = svc
            .create(cart(table_id, vec![(tea, 1)]))
            .await
            .unwrap()
            .order
            .id;

        svc.update(
            id,
            OrderUpdate {
                status: Some(OrderStatus::Ready),
                note: None,
            },
        )
        .await
        .unwrap();

        // Backward
        let err = svc
            .update(
                id,
                OrderUpdate {
                    status: Some(OrderStatus::Preparing),
                    note: None,
                },
            )
            .await;
        assert!(matches!(err, Err(AppError::Invalid(_))));

        svc.update(
            id,
            OrderUpdate {
                status: Some(OrderStatus::Served),
                note: None,
            },
        )
        .await
        .unwrap();

        // Terminal orders are immutable, even for note-only updates
        let err = svc
            .update(
                id,
                OrderUpdate {
                    status: None,
                    note: Some("late note".into()),
                },
            )
            .await;
        assert!(matches!(err, Err(AppError::Invalid(_))));
    }

    #[tokio::test]
    async fn update_requires_status_or_note() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 8).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;
        let svc = engine(&pool);
        let id = svc
            .create(cart(table_id, vec![(tea, 1)]))
            .await
            .unwrap()
            .order
            .id;

        let err = svc
            .update(
                id,
                OrderUpdate {
                    status: None,
                    note: None,
                },
            )
            .await;
        assert!(matches!(err, Err(AppError::Invalid(_))));
    }

    #[tokio::test]
    async fn serving_frees_the_table() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 9).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;
        let svc = engine(&pool);
        let id = svc
            .create(cart(table_id, vec![(tea, 1)]))
            .await
            .unwrap()
            .order
            .id;

        svc.update(
            id,
            OrderUpdate {
                status: Some(OrderStatus::Served),
                note: None,
            },
        )
        .await
        .unwrap();

        let table = dining_table::find_by_id(&pool, table_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(table.status, TableStatus::Available);
    }

    #[tokio::test]
    async fn delete_keeps_table_occupied_while_other_orders_open() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 10).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;
        let svc = engine(&pool);
        let first = svc
            .create(cart(table_id, vec![(tea, 1)]))
            .await
            .unwrap()
            .order
            .id;
        let _second = svc
            .create(cart(table_id, vec![(tea, 2)]))
            .await
            .unwrap()
            .order
            .id;

        svc.delete(first).await.unwrap();

        assert!(order::find_by_id(&pool, first).await.unwrap().is_none());
        let table = dining_table::find_by_id(&pool, table_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(table.status, TableStatus::Occupied);
    }

    #[tokio::test]
    async fn delete_of_last_open_order_frees_the_table() {
        let pool = test_pool().await;
        let table_id = seed_table(&pool, 11).await;
        let tea = seed_menu_item(&pool, "Tea", 3.0).await;
        let svc = engine(&pool);
        let id = svc
            .create(cart(table_id, vec![(tea, 1)]))
            .await
            .unwrap()
            .order
            .id;

        svc.delete(id).await.unwrap();

        let table = dining_table::find_by_id(&pool, table_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(table.status, TableStatus::Available);
        // Line items cascade with the order
        assert!(order::find_items(&pool, id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_order_is_not_found() {
        let pool = test_pool().await;
        let err = engine(&pool).delete(404404).await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }
}
