use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 客户端发来的消息
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    #[serde(default)]
    pub message: String,
}

/// 推送给客户端的帧
///
/// 确认、流式块、完成信号、直接回复和结构化错误共用同一条出站通道
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Ack { message: String },
    AssistantChunk { chunk: String },
    AssistantDone,
    Assistant { message: String },
    Error { code: String, message: String },
}

pub const ACK_TEXT: &str = "Message received";
pub const APOLOGY_TEXT: &str = "Sorry, I encountered an error processing your message.";

impl ServerFrame {
    pub fn ack() -> Self {
        ServerFrame::Ack {
            message: ACK_TEXT.to_string(),
        }
    }

    pub fn chunk(chunk: impl Into<String>) -> Self {
        ServerFrame::AssistantChunk {
            chunk: chunk.into(),
        }
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        ServerFrame::Assistant {
            message: message.into(),
        }
    }

    /// 通用道歉回复，不暴露内部错误
    pub fn apology() -> Self {
        Self::assistant(APOLOGY_TEXT)
    }

    pub fn not_found(session_id: impl std::fmt::Display) -> Self {
        ServerFrame::Error {
            code: "not_found".to_string(),
            message: format!("Session {} not found", session_id),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ServerFrame::Error {
            code: "bad_request".to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerFrame::Ack { .. } => "ack",
            ServerFrame::AssistantChunk { .. } => "assistant_chunk",
            ServerFrame::AssistantDone => "assistant_done",
            ServerFrame::Assistant { .. } => "assistant",
            ServerFrame::Error { .. } => "error",
        }
    }

    /// 错误帧发送后连接应当关闭
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerFrame::Error { code, .. } if code == "not_found")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionBody {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummaryBody {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageBody {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagesBody {
    pub messages: Vec<MessageBody>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_wire_format() {
        let json = serde_json::to_value(ServerFrame::chunk("Hel")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "assistant_chunk", "chunk": "Hel"}));

        let json = serde_json::to_value(ServerFrame::AssistantDone).unwrap();
        assert_eq!(json, serde_json::json!({"type": "assistant_done"}));

        let json = serde_json::to_value(ServerFrame::ack()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "ack", "message": "Message received"})
        );
    }

    #[test]
    fn test_client_message_missing_field() {
        let msg: ClientMessage = serde_json::from_str("{}").unwrap();
        assert!(msg.message.is_empty());
    }

    #[test]
    fn test_not_found_is_terminal() {
        assert!(ServerFrame::not_found("x").is_terminal());
        assert!(!ServerFrame::bad_request("x").is_terminal());
        assert!(!ServerFrame::apology().is_terminal());
    }
}
