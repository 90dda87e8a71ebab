//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use shared::models::{
    BillPreview, CheckoutSummary, DiningTable, DiningTableCreate, DiningTableUpdate, PaymentMethod,
};

use crate::core::ServerState;
use crate::db::repository::dining_table;
use crate::utils::{AppError, AppResult};

/// PATCH /api/tables/:id/checkout 请求体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
}

/// GET /api/tables - 获取所有桌台
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<DiningTable>>> {
    let tables = dining_table::find_all(&state.pool).await?;
    Ok(Json(tables))
}

/// GET /api/tables/:id - 获取单个桌台
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let table = dining_table::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {id} not found")))?;
    Ok(Json(table))
}

/// POST /api/tables - 创建桌台
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    let table = dining_table::create(&state.pool, payload).await?;
    Ok(Json(table))
}

/// PATCH /api/tables/:id - 更新桌台
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    let table = dining_table::update(&state.pool, id, payload).await?;
    Ok(Json(table))
}

/// PATCH /api/tables/:id/checkout - 结账（聚合窗口内订单成账单）
pub async fn checkout(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutSummary>> {
    let summary = state
        .checkout_engine()
        .checkout(id, payload.payment_method)
        .await?;
    Ok(Json(summary))
}

/// POST /api/tables/:id/checkout - 翻台（只清窗口边界，不开账单）
pub async fn clear_marker(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let table = state.checkout_engine().clear_marker(id).await?;
    Ok(Json(table))
}

/// PATCH /api/tables/:id/callStaff - 呼叫买单（只读预览 + 广播）
pub async fn call_staff(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BillPreview>> {
    let preview = state.staff_call().call_for_bill(id).await?;
    Ok(Json(preview))
}
