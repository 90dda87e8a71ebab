//! Order Repository
//!
//! Reads for the API layer. Order mutations (create, status change,
//! delete) run inside service-owned transactions, see
//! [`crate::services::order_lifecycle`].

use super::RepoResult;
use shared::models::{Order, OrderItem, OrderWithItems};
use sqlx::SqlitePool;

pub(crate) const ORDER_SELECT: &str =
    "SELECT id, table_id, total_amount, status, order_time, customer_name, note FROM customer_order";

pub(crate) const ITEM_SELECT: &str =
    "SELECT id, order_id, menu_item_id, name, price, quantity, note FROM order_item";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} ORDER BY order_time DESC");
    let rows = sqlx::query_as::<_, Order>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id_with_items(
    pool: &SqlitePool,
    id: i64,
) -> RepoResult<Option<OrderWithItems>> {
    let Some(order) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let items = find_items(pool, id).await?;
    Ok(Some(OrderWithItems { order, items }))
}

/// All non-cancelled orders for a table, oldest first (staff-call input)
pub async fn find_open_by_table(pool: &SqlitePool, table_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "{ORDER_SELECT} WHERE table_id = ? AND status != 'cancelled' ORDER BY order_time"
    );
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(table_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Orders in the given list, oldest first (bill receipt view)
pub async fn find_by_ids(pool: &SqlitePool, ids: &[i64]) -> RepoResult<Vec<Order>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("{ORDER_SELECT} WHERE id IN ({placeholders}) ORDER BY order_time");
    let mut query = sqlx::query_as::<_, Order>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows)
}
