//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use shared::models::{Order, OrderCreate, OrderUpdate, OrderWithItems};

use crate::core::ServerState;
use crate::db::repository::order;
use crate::utils::{AppError, AppResult};

/// POST /api/orders - 创建订单（顾客购物车提交）
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<OrderWithItems>)> {
    let created = state.order_lifecycle().create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/orders - 获取所有订单（含订单行）
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<OrderWithItems>>> {
    let orders = order::find_all(&state.pool).await?;
    let mut result = Vec::with_capacity(orders.len());
    for o in orders {
        let items = order::find_items(&state.pool, o.id).await?;
        result.push(OrderWithItems { order: o, items });
    }
    Ok(Json(result))
}

/// GET /api/orders/:id - 获取单个订单
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderWithItems>> {
    let order = order::find_by_id_with_items(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
    Ok(Json(order))
}

/// PATCH /api/orders/:id - 推进状态 / 修改备注
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderUpdate>,
) -> AppResult<Json<Order>> {
    let updated = state.order_lifecycle().update(id, payload).await?;
    Ok(Json(updated))
}

/// DELETE /api/orders/:id - 撤单
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.order_lifecycle().delete(id).await?;
    Ok(Json(true))
}
