use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler};
use crate::modules::chat::domain::{SessionId, SessionSummary};
use crate::modules::chat::ports::SessionRepository;

/// 获取会话查询
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: SessionId,
}

impl GetSessionQuery {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

/// 获取会话查询响应
#[derive(Debug, Clone)]
pub struct GetSessionResponse {
    pub session: Option<SessionSummary>,
}

/// 获取会话查询处理器
pub struct GetSessionHandler {
    session_repository: Arc<dyn SessionRepository>,
}

impl GetSessionHandler {
    pub fn new(session_repository: Arc<dyn SessionRepository>) -> Self {
        Self { session_repository }
    }
}

#[async_trait]
impl QueryHandler<GetSessionQuery, GetSessionResponse> for GetSessionHandler {
    async fn handle(&self, query: GetSessionQuery) -> Result<GetSessionResponse, ApplicationError> {
        let session = self.session_repository.get(query.session_id).await?;
        Ok(GetSessionResponse { session })
    }
}
