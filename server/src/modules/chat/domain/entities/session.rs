use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::value_objects::SessionId;
use super::{Message, MessageRole};

/// 会话实体 - 聚合根
///
/// 持有按追加顺序排列的消息历史，只能追加，不能修改或重排
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// 会话唯一标识
    id: SessionId,
    /// 创建时间
    created_at: DateTime<Utc>,
    /// 消息历史
    messages: Vec<Message>,
}

/// 会话概要（用于列表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

impl Session {
    /// 创建新会话
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    // Getters
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    // 业务方法

    /// 追加一条消息并返回其副本
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) -> Message {
        let message = Message::new(role, content);
        self.messages.push(message.clone());
        message
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            created_at: self.created_at,
            message_count: self.messages.len(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_session() {
        let session = Session::new();
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.summary().session_id, session.id());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut session = Session::default();
        session.append(MessageRole::User, "first");
        session.append(MessageRole::Assistant, "second");
        session.append(MessageRole::User, "third");

        let contents: Vec<&str> = session.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(session.summary().message_count, 3);
    }
}
