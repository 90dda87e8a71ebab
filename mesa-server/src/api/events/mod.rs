//! Events API 模块
//!
//! SSE 事件流。员工看板订阅 `?topic=dashboard`，桌台点餐页
//! 订阅 `?topic=table-<id>`；不带 topic 订阅全部（调试用）。

use axum::{
    Router,
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;

use shared::Topic;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/events", get(stream))
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    topic: Option<String>,
}

/// GET /api/events?topic=dashboard|table-{id} - 订阅事件流
async fn stream(
    State(state): State<ServerState>,
    Query(query): Query<EventsQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let topic: Option<Topic> = match &query.topic {
        Some(raw) => Some(raw.parse().map_err(AppError::invalid)?),
        None => None,
    };

    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| {
        let item = match msg {
            Ok(ev) if topic.is_none_or(|t| t == ev.topic) => {
                Some(Event::default().event(ev.event.name()).json_data(&ev))
            }
            // Filtered out, or the subscriber lagged behind the channel
            _ => None,
        };
        futures::future::ready(item)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
