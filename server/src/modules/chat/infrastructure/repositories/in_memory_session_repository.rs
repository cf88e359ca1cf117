use async_trait::async_trait;
use dashmap::DashMap;

use crate::modules::chat::domain::{Message, MessageRole, Session, SessionId, SessionSummary};
use crate::modules::chat::ports::{RepositoryError, SessionRepository};

/// 内存会话仓储
///
/// 按会话分片加锁，不同会话之间的读写互不阻塞
pub struct InMemorySessionRepository {
    sessions: DashMap<SessionId, Session>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self) -> Result<SessionSummary, RepositoryError> {
        let session = Session::new();
        let summary = session.summary();
        self.sessions.insert(session.id(), session);
        Ok(summary)
    }

    async fn append(
        &self,
        id: SessionId,
        role: MessageRole,
        content: String,
    ) -> Result<Message, RepositoryError> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        Ok(session.append(role, content))
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, RepositoryError> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|entry| entry.value().summary())
            .collect();

        // 按创建时间排序（最早的在前）
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(summaries)
    }

    async fn get(&self, id: SessionId) -> Result<Option<SessionSummary>, RepositoryError> {
        Ok(self.sessions.get(&id).map(|session| session.summary()))
    }

    async fn history(&self, id: SessionId) -> Result<Vec<Message>, RepositoryError> {
        self.sessions
            .get(&id)
            .map(|session| session.messages().to_vec())
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn remove(&self, id: SessionId) -> Result<usize, RepositoryError> {
        self.sessions
            .remove(&id)
            .map(|(_, session)| session.message_count())
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn exists(&self, id: SessionId) -> Result<bool, RepositoryError> {
        Ok(self.sessions.contains_key(&id))
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.sessions.len())
    }
}
