use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::value_objects::{Fragment, SessionId};

/// 事件总线记录基础 trait
pub trait BusRecord: Serialize + Send + Sync {
    fn event_type(&self) -> &'static str;
    /// 分区键，同一键的记录保持有序
    fn key(&self) -> &str;
}

/// 聊天请求记录（发往后端流水线）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequestRecord {
    pub session_id: String,
    pub message: String,
    /// UNIX 秒（带小数）
    pub timestamp: f64,
}

impl ChatRequestRecord {
    pub fn new(session_id: SessionId, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            message: message.into(),
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }
}

impl BusRecord for ChatRequestRecord {
    fn event_type(&self) -> &'static str {
        "chat.request"
    }

    fn key(&self) -> &str {
        &self.session_id
    }
}

/// 聊天响应记录（来自后端流水线）
///
/// 除 session_id 外的字段缺省时按空值处理
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponseRecord {
    pub session_id: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub is_chunk: bool,
    #[serde(default)]
    pub is_done: bool,
}

impl ChatResponseRecord {
    pub fn chunk(session_id: SessionId, chunk: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            response: chunk.into(),
            is_chunk: true,
            is_done: false,
        }
    }

    pub fn done(session_id: SessionId) -> Self {
        Self {
            session_id: session_id.to_string(),
            response: String::new(),
            is_chunk: false,
            is_done: true,
        }
    }

    pub fn direct(session_id: SessionId, response: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            response: response.into(),
            is_chunk: false,
            is_done: false,
        }
    }

    /// 拆分为会话 ID 和片段
    pub fn into_fragment(self) -> Result<(SessionId, Fragment), uuid::Error> {
        let session_id = SessionId::parse(&self.session_id)?;
        Ok((
            session_id,
            Fragment {
                content: self.response,
                is_chunk: self.is_chunk,
                is_done: self.is_done,
            },
        ))
    }
}

impl BusRecord for ChatResponseRecord {
    fn event_type(&self) -> &'static str {
        if self.is_chunk {
            "chat.response.chunk"
        } else if self.is_done {
            "chat.response.done"
        } else {
            "chat.response"
        }
    }

    fn key(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_record_defaults() {
        let id = SessionId::new();
        let raw = format!(r#"{{"session_id":"{}"}}"#, id);
        let record: ChatResponseRecord = serde_json::from_str(&raw).unwrap();

        assert!(record.response.is_empty());
        assert!(!record.is_chunk);
        assert!(!record.is_done);

        let (parsed, fragment) = record.into_fragment().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(fragment, Fragment::direct(""));
    }

    #[test]
    fn test_request_record_wire_format() {
        let id = SessionId::new();
        let record = ChatRequestRecord::new(id, "hello");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["session_id"], id.to_string());
        assert_eq!(json["message"], "hello");
        assert!(json["timestamp"].as_f64().unwrap() > 0.0);
        assert_eq!(record.key(), id.to_string());
    }

    #[test]
    fn test_bad_session_id_rejected() {
        let record = ChatResponseRecord {
            session_id: "nope".to_string(),
            response: "x".to_string(),
            is_chunk: true,
            is_done: false,
        };
        assert!(record.into_fragment().is_err());
    }
}
