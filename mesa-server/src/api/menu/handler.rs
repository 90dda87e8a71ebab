//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};

use crate::core::ServerState;
use crate::db::repository::menu_item;
use crate::utils::{AppError, AppResult};

/// GET /api/menu - 获取菜单
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<MenuItem>>> {
    let items = menu_item::find_all(&state.pool).await?;
    Ok(Json(items))
}

/// GET /api/menu/:id - 获取单个菜品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MenuItem>> {
    let item = menu_item::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Menu item {id} not found")))?;
    Ok(Json(item))
}

/// POST /api/menu - 创建菜品
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<MenuItemCreate>,
) -> AppResult<Json<MenuItem>> {
    if payload.price < 0.0 {
        return Err(AppError::validation("Price must not be negative"));
    }
    let item = menu_item::create(&state.pool, payload).await?;
    Ok(Json(item))
}

/// PUT /api/menu/:id - 更新菜品
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MenuItemUpdate>,
) -> AppResult<Json<MenuItem>> {
    if let Some(price) = payload.price
        && price < 0.0
    {
        return Err(AppError::validation("Price must not be negative"));
    }
    let item = menu_item::update(&state.pool, id, payload).await?;
    Ok(Json(item))
}

/// DELETE /api/menu/:id - 下架菜品（软删除，历史订单不受影响）
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let removed = menu_item::delete(&state.pool, id).await?;
    if !removed {
        return Err(AppError::not_found(format!("Menu item {id} not found")));
    }
    Ok(Json(true))
}
