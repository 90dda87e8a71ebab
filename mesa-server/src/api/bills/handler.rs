//! Bill API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use shared::models::{Bill, BillWithOrders};

use crate::core::ServerState;
use crate::db::repository::{bill, order};
use crate::utils::{AppError, AppResult};

/// GET /api/bills - 获取所有账单（新到旧）
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Bill>>> {
    let bills = bill::find_all(&state.pool).await?;
    Ok(Json(bills))
}

/// GET /api/bills/:id - 获取账单及其覆盖的订单（小票视图）
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BillWithOrders>> {
    let bill = bill::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Bill {id} not found")))?;
    let orders = order::find_by_ids(&state.pool, &bill.order_ids).await?;
    Ok(Json(BillWithOrders { bill, orders }))
}
