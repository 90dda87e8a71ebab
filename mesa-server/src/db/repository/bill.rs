//! Bill Repository
//!
//! Bills are written only by the checkout transaction; this module is
//! the read side plus the row ↔ model mapping for the denormalized
//! `order_ids` JSON column.

use super::{RepoError, RepoResult};
use shared::models::{Bill, PaymentMethod};
use sqlx::SqlitePool;

pub(crate) const BILL_SELECT: &str =
    "SELECT id, table_id, total_amount, order_ids, payment_method, payment_time, created_at FROM bill";

/// Raw bill row — `order_ids` still a JSON string
#[derive(Debug, sqlx::FromRow)]
pub struct BillRow {
    pub id: i64,
    pub table_id: i64,
    pub total_amount: f64,
    pub order_ids: String,
    pub payment_method: PaymentMethod,
    pub payment_time: i64,
    pub created_at: i64,
}

impl BillRow {
    pub fn into_bill(self) -> RepoResult<Bill> {
        let order_ids: Vec<i64> = serde_json::from_str(&self.order_ids).map_err(|e| {
            RepoError::Database(format!("Corrupt order_ids on bill {}: {e}", self.id))
        })?;
        Ok(Bill {
            id: self.id,
            table_id: self.table_id,
            total_amount: self.total_amount,
            order_ids,
            payment_method: self.payment_method,
            payment_time: self.payment_time,
            created_at: self.created_at,
        })
    }
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Bill>> {
    let sql = format!("{BILL_SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, BillRow>(&sql).fetch_all(pool).await?;
    rows.into_iter().map(BillRow::into_bill).collect()
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Bill>> {
    let sql = format!("{BILL_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, BillRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(BillRow::into_bill).transpose()
}

pub async fn find_by_table(pool: &SqlitePool, table_id: i64) -> RepoResult<Vec<Bill>> {
    let sql = format!("{BILL_SELECT} WHERE table_id = ? ORDER BY created_at");
    let rows = sqlx::query_as::<_, BillRow>(&sql)
        .bind(table_id)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(BillRow::into_bill).collect()
}

/// Every order id ever billed for this table (all-time exclusion set
/// for the staff-call preview)
pub async fn billed_order_ids(
    pool: &SqlitePool,
    table_id: i64,
) -> RepoResult<std::collections::HashSet<i64>> {
    let bills = find_by_table(pool, table_id).await?;
    Ok(bills.into_iter().flat_map(|b| b.order_ids).collect())
}
