// Session Commands
//
// 使用 ChatModule 的 CQRS 命令和查询处理会话操作

use axum::extract::{Path, State};
use axum::Json;

use crate::infrastructure::AppState;
use crate::modules::chat::{
    CreateSessionCommand, DeleteSessionCommand, GetSessionQuery, ListMessagesQuery,
    ListSessionsQuery, SessionId, SessionSummary,
};
use crate::shared::{
    AppError, AppResult, CreateSessionBody, MessageBody, MessagesBody, SessionSummaryBody,
};

impl From<SessionSummary> for SessionSummaryBody {
    fn from(summary: SessionSummary) -> Self {
        Self {
            session_id: summary.session_id.to_string(),
            created_at: summary.created_at,
            message_count: summary.message_count,
        }
    }
}

/// 路径中的会话 ID 无法解析时按不存在处理
fn parse_session_id(raw: &str) -> AppResult<SessionId> {
    SessionId::parse(raw).map_err(|_| AppError::SessionNotFound(raw.to_string()))
}

/// 创建会话
pub async fn session_create(State(state): State<AppState>) -> AppResult<Json<CreateSessionBody>> {
    let response = state
        .chat_module
        .create_session(CreateSessionCommand::new())
        .await?;

    Ok(Json(CreateSessionBody {
        session_id: response.session.session_id.to_string(),
    }))
}

/// 列出会话
pub async fn session_list(State(state): State<AppState>) -> AppResult<Json<Vec<SessionSummaryBody>>> {
    let response = state
        .chat_module
        .list_sessions(ListSessionsQuery::new())
        .await?;

    Ok(Json(
        response.sessions.into_iter().map(Into::into).collect(),
    ))
}

/// 获取会话概要
pub async fn session_get(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionSummaryBody>> {
    let id = parse_session_id(&session_id)?;
    let response = state.chat_module.get_session(GetSessionQuery::new(id)).await?;

    response
        .session
        .map(|summary| Json(summary.into()))
        .ok_or(AppError::SessionNotFound(session_id))
}

/// 获取会话消息历史
pub async fn session_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<MessagesBody>> {
    let id = parse_session_id(&session_id)?;
    let response = state
        .chat_module
        .list_messages(ListMessagesQuery::new(id))
        .await?;

    let messages = response
        .messages
        .into_iter()
        .map(|message| MessageBody {
            role: message.role().as_str().to_string(),
            content: message.content().to_string(),
            timestamp: message.created_at(),
        })
        .collect();

    Ok(Json(MessagesBody { messages }))
}

/// 清除会话
pub async fn session_delete(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let id = parse_session_id(&session_id)?;
    state
        .chat_module
        .delete_session(DeleteSessionCommand::new(id))
        .await?;

    Ok(Json(serde_json::json!({
        "message": format!("Session {} cleared", id)
    })))
}
