use async_trait::async_trait;
use thiserror::Error;

use super::super::domain::{Message, MessageRole, SessionId, SessionSummary};

/// 仓储错误类型
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Storage error: {0}")]
    StorageError(String),
}

/// 会话仓储端口
///
/// 保存每个会话按追加顺序排列的消息历史
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// 创建空会话，返回其 ID
    async fn create(&self) -> Result<SessionSummary, RepositoryError>;

    /// 追加一条消息；会话不存在时返回 NotFound
    async fn append(
        &self,
        id: SessionId,
        role: MessageRole,
        content: String,
    ) -> Result<Message, RepositoryError>;

    /// 所有会话的快照
    async fn list(&self) -> Result<Vec<SessionSummary>, RepositoryError>;

    /// 获取单个会话概要
    async fn get(&self, id: SessionId) -> Result<Option<SessionSummary>, RepositoryError>;

    /// 按追加顺序返回消息历史
    async fn history(&self, id: SessionId) -> Result<Vec<Message>, RepositoryError>;

    /// 删除会话及其历史；会话不存在时返回 NotFound，返回删除的消息数量
    async fn remove(&self, id: SessionId) -> Result<usize, RepositoryError>;

    /// 检查会话是否存在
    async fn exists(&self, id: SessionId) -> Result<bool, RepositoryError>;

    /// 获取会话总数
    async fn count(&self) -> Result<usize, RepositoryError>;
}
