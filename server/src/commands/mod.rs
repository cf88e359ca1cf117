// HTTP / WebSocket 接口层
//
// - session: 会话的创建、查询、历史和清除
// - chat: WebSocket 连接入口

pub mod chat;
pub mod session;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::infrastructure::AppState;
use crate::modules::chat::ListSessionsQuery;
use crate::shared::AppResult;

pub use chat::*;
pub use session::*;

/// 构建路由
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/sessions",
            get(session::session_list).post(session::session_create),
        )
        .route(
            "/api/sessions/{session_id}",
            get(session::session_get).delete(session::session_delete),
        )
        .route(
            "/api/sessions/{session_id}/messages",
            get(session::session_messages),
        )
        .route("/ws/{session_id}", get(chat::chat_ws))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查
async fn health(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let sessions = state
        .chat_module
        .list_sessions(ListSessionsQuery::new())
        .await?
        .total;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "chat-relay",
        "connections": state.connection_registry.count(),
        "sessions": sessions,
    })))
}
