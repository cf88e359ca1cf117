use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler};
use crate::modules::chat::domain::SessionId;
use crate::modules::chat::ports::SessionRepository;

/// 删除会话命令
#[derive(Debug, Clone)]
pub struct DeleteSessionCommand {
    pub session_id: SessionId,
}

impl DeleteSessionCommand {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

/// 删除会话命令响应
#[derive(Debug, Clone)]
pub struct DeleteSessionResponse {
    /// 删除的消息数量
    pub deleted_messages: usize,
}

/// 删除会话命令处理器
///
/// 删除不存在的会话返回 SessionNotFound
pub struct DeleteSessionHandler {
    session_repository: Arc<dyn SessionRepository>,
}

impl DeleteSessionHandler {
    pub fn new(session_repository: Arc<dyn SessionRepository>) -> Self {
        Self { session_repository }
    }
}

#[async_trait]
impl CommandHandler<DeleteSessionCommand, DeleteSessionResponse> for DeleteSessionHandler {
    async fn handle(
        &self,
        command: DeleteSessionCommand,
    ) -> Result<DeleteSessionResponse, ApplicationError> {
        let deleted_messages = self.session_repository.remove(command.session_id).await?;
        tracing::info!(
            "[DeleteSession] Cleared session {} ({} messages)",
            command.session_id,
            deleted_messages
        );

        Ok(DeleteSessionResponse { deleted_messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::MessageRole;
    use crate::modules::chat::infrastructure::InMemorySessionRepository;

    #[tokio::test]
    async fn test_delete_session_with_messages() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let handler = DeleteSessionHandler::new(repo.clone());

        // 创建会话和消息
        let session_id = repo.create().await.unwrap().session_id;
        repo.append(session_id, MessageRole::User, "Hello".to_string())
            .await
            .unwrap();
        repo.append(session_id, MessageRole::Assistant, "Hi".to_string())
            .await
            .unwrap();

        let response = handler
            .handle(DeleteSessionCommand::new(session_id))
            .await
            .unwrap();

        assert_eq!(response.deleted_messages, 2);
        assert!(!repo.exists(session_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_session() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let handler = DeleteSessionHandler::new(repo);

        let result = handler
            .handle(DeleteSessionCommand::new(SessionId::new()))
            .await;

        assert!(matches!(result, Err(ApplicationError::SessionNotFound(_))));
    }
}
