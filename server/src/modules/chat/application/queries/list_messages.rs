use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler};
use crate::modules::chat::domain::{Message, SessionId};
use crate::modules::chat::ports::SessionRepository;

/// 获取会话消息历史查询
#[derive(Debug, Clone)]
pub struct ListMessagesQuery {
    pub session_id: SessionId,
}

impl ListMessagesQuery {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

/// 消息历史查询响应
#[derive(Debug, Clone)]
pub struct ListMessagesResponse {
    /// 按追加顺序排列
    pub messages: Vec<Message>,
}

/// 消息历史查询处理器
pub struct ListMessagesHandler {
    session_repository: Arc<dyn SessionRepository>,
}

impl ListMessagesHandler {
    pub fn new(session_repository: Arc<dyn SessionRepository>) -> Self {
        Self { session_repository }
    }
}

#[async_trait]
impl QueryHandler<ListMessagesQuery, ListMessagesResponse> for ListMessagesHandler {
    async fn handle(
        &self,
        query: ListMessagesQuery,
    ) -> Result<ListMessagesResponse, ApplicationError> {
        let messages = self.session_repository.history(query.session_id).await?;
        Ok(ListMessagesResponse { messages })
    }
}
