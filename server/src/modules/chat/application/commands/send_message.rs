use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler};
use crate::modules::chat::domain::{ChatRequestRecord, Message, MessageRole, SessionId};
use crate::modules::chat::ports::{RequestPublisher, SessionRepository};

/// 发送消息命令
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    /// 会话 ID
    pub session_id: SessionId,
    /// 用户消息内容
    pub content: String,
}

impl SendMessageCommand {
    pub fn new(session_id: SessionId, content: impl Into<String>) -> Self {
        Self {
            session_id,
            content: content.into(),
        }
    }
}

/// 发送消息响应
#[derive(Debug, Clone)]
pub struct SendMessageResponse {
    /// 已写入历史的用户消息
    pub user_message: Message,
}

/// 发送消息命令处理器
///
/// 把用户消息追加到会话历史，再发布到请求主题交给后端流水线。
/// 回复通过响应主题异步到达，由流式中继处理
pub struct SendMessageHandler {
    session_repository: Arc<dyn SessionRepository>,
    request_publisher: Arc<dyn RequestPublisher>,
}

impl SendMessageHandler {
    pub fn new(
        session_repository: Arc<dyn SessionRepository>,
        request_publisher: Arc<dyn RequestPublisher>,
    ) -> Self {
        Self {
            session_repository,
            request_publisher,
        }
    }
}

#[async_trait]
impl CommandHandler<SendMessageCommand, SendMessageResponse> for SendMessageHandler {
    async fn handle(
        &self,
        command: SendMessageCommand,
    ) -> Result<SendMessageResponse, ApplicationError> {
        // 验证输入
        if command.content.is_empty() {
            return Err(ApplicationError::ValidationError(
                "Message content cannot be empty".to_string(),
            ));
        }

        // 追加用户消息（会话不存在时返回 SessionNotFound）
        let user_message = self
            .session_repository
            .append(command.session_id, MessageRole::User, command.content.clone())
            .await?;

        // 发布到后端流水线
        let record = ChatRequestRecord::new(command.session_id, command.content);
        if let Err(e) = self.request_publisher.publish_request(&record).await {
            tracing::error!(
                "[SendMessage] Failed to publish request for session {}: {}",
                command.session_id,
                e
            );
            return Err(e.into());
        }

        Ok(SendMessageResponse { user_message })
    }
}
