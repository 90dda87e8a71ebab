//! Dining Table Repository

use super::{RepoError, RepoResult};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatus};
use shared::util;
use sqlx::SqlitePool;

pub(crate) const TABLE_SELECT: &str =
    "SELECT id, number, seats, status, last_cleared_at, qr_code, created_at FROM dining_table";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<DiningTable>> {
    let sql = format!("{TABLE_SELECT} ORDER BY number");
    let rows = sqlx::query_as::<_, DiningTable>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<DiningTable>> {
    let sql = format!("{TABLE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, DiningTable>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_number(pool: &SqlitePool, number: i32) -> RepoResult<Option<DiningTable>> {
    let sql = format!("{TABLE_SELECT} WHERE number = ?");
    let row = sqlx::query_as::<_, DiningTable>(&sql)
        .bind(number)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: DiningTableCreate) -> RepoResult<DiningTable> {
    if find_by_number(pool, data.number).await?.is_some() {
        return Err(RepoError::Conflict(format!(
            "Table number {} already exists",
            data.number
        )));
    }

    let id = util::snowflake_id();
    let now = util::now_millis();
    let seats = data.seats.unwrap_or(4);
    // New tables start with an open window (last_cleared_at = 0) so the
    // very first orders are always inside it
    sqlx::query(
        "INSERT INTO dining_table (id, number, seats, status, last_cleared_at, qr_code, created_at) \
         VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
    )
    .bind(id)
    .bind(data.number)
    .bind(seats)
    .bind(TableStatus::Available)
    .bind(data.qr_code)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create dining table".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: DiningTableUpdate) -> RepoResult<DiningTable> {
    let rows = sqlx::query(
        "UPDATE dining_table SET \
             seats = COALESCE(?1, seats), \
             status = COALESCE(?2, status), \
             qr_code = COALESCE(?3, qr_code) \
         WHERE id = ?4",
    )
    .bind(data.seats)
    .bind(data.status)
    .bind(data.qr_code)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Table {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Table {id} not found")))
}
