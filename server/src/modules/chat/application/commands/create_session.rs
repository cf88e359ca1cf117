use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler};
use crate::modules::chat::domain::SessionSummary;
use crate::modules::chat::ports::SessionRepository;

/// 创建会话命令
#[derive(Debug, Clone, Default)]
pub struct CreateSessionCommand;

impl CreateSessionCommand {
    pub fn new() -> Self {
        Self
    }
}

/// 创建会话命令响应
#[derive(Debug, Clone)]
pub struct CreateSessionResponse {
    pub session: SessionSummary,
}

/// 创建会话命令处理器
pub struct CreateSessionHandler {
    session_repository: Arc<dyn SessionRepository>,
}

impl CreateSessionHandler {
    pub fn new(session_repository: Arc<dyn SessionRepository>) -> Self {
        Self { session_repository }
    }
}

#[async_trait]
impl CommandHandler<CreateSessionCommand, CreateSessionResponse> for CreateSessionHandler {
    async fn handle(
        &self,
        _command: CreateSessionCommand,
    ) -> Result<CreateSessionResponse, ApplicationError> {
        let session = self.session_repository.create().await?;
        tracing::info!("[CreateSession] Created session {}", session.session_id);

        Ok(CreateSessionResponse { session })
    }
}
