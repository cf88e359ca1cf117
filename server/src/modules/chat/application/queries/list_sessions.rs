use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler};
use crate::modules::chat::domain::SessionSummary;
use crate::modules::chat::ports::SessionRepository;

/// 列出会话查询
#[derive(Debug, Clone, Default)]
pub struct ListSessionsQuery;

impl ListSessionsQuery {
    pub fn new() -> Self {
        Self
    }
}

/// 列出会话查询响应
#[derive(Debug, Clone)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
}

/// 列出会话查询处理器
pub struct ListSessionsHandler {
    session_repository: Arc<dyn SessionRepository>,
}

impl ListSessionsHandler {
    pub fn new(session_repository: Arc<dyn SessionRepository>) -> Self {
        Self { session_repository }
    }
}

#[async_trait]
impl QueryHandler<ListSessionsQuery, ListSessionsResponse> for ListSessionsHandler {
    async fn handle(
        &self,
        _query: ListSessionsQuery,
    ) -> Result<ListSessionsResponse, ApplicationError> {
        let sessions = self.session_repository.list().await?;
        let total = sessions.len();

        Ok(ListSessionsResponse { sessions, total })
    }
}
