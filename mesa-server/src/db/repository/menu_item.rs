//! Menu Item Repository

use super::{RepoError, RepoResult};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};
use shared::util;
use sqlx::SqlitePool;

pub(crate) const MENU_SELECT: &str =
    "SELECT id, name, price, category, is_available, created_at, updated_at FROM menu_item";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<MenuItem>> {
    let sql = format!("{MENU_SELECT} ORDER BY category, name");
    let rows = sqlx::query_as::<_, MenuItem>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<MenuItem>> {
    let sql = format!("{MENU_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, MenuItem>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: MenuItemCreate) -> RepoResult<MenuItem> {
    let id = util::snowflake_id();
    let now = util::now_millis();
    sqlx::query(
        "INSERT INTO menu_item (id, name, price, category, is_available, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(data.price)
    .bind(data.category.unwrap_or_default())
    .bind(data.is_available.unwrap_or(true))
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create menu item".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: MenuItemUpdate) -> RepoResult<MenuItem> {
    let now = util::now_millis();
    let rows = sqlx::query(
        "UPDATE menu_item SET \
             name = COALESCE(?1, name), \
             price = COALESCE(?2, price), \
             category = COALESCE(?3, category), \
             is_available = COALESCE(?4, is_available), \
             updated_at = ?5 \
         WHERE id = ?6",
    )
    .bind(data.name)
    .bind(data.price)
    .bind(data.category)
    .bind(data.is_available)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Menu item {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Menu item {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    // Soft delete: historical order items snapshot name/price, but the
    // catalog row must stay resolvable for re-orders
    let now = util::now_millis();
    let rows = sqlx::query(
        "UPDATE menu_item SET is_available = 0, updated_at = ? WHERE id = ? AND is_available = 1",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
