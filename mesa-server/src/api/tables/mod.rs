//! Dining Table API 模块
//!
//! 桌台 CRUD 之外，还承载两条桌台级业务路由：
//! `PATCH /{id}/checkout`（结账）和 `PATCH /{id}/callStaff`（呼叫买单）。
//! `POST /{id}/checkout` 是不开账单的翻台（清窗口边界）。

mod handler;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id).patch(handler::update))
        .route(
            "/{id}/checkout",
            patch(handler::checkout).post(handler::clear_marker),
        )
        .route("/{id}/callStaff", patch(handler::call_staff))
}
