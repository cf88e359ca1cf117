use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::super::domain::ChatRequestRecord;

/// 事件总线错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("Event bus closed: {0}")]
    Closed(String),

    #[error("Publish to {topic} timed out after {timeout_ms}ms")]
    Timeout { topic: String, timeout_ms: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// 总线上的原始记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub offset: u64,
}

/// 请求发布端口
#[async_trait]
pub trait RequestPublisher: Send + Sync {
    async fn publish_request(&self, record: &ChatRequestRecord) -> Result<(), BusError>;
}

/// 响应订阅端口
///
/// 返回原始记录，解码由中继的消费循环负责
#[async_trait]
pub trait ResponseSubscriber: Send + Sync {
    async fn subscribe_responses(&self) -> Result<mpsc::Receiver<RawRecord>, BusError>;
}
