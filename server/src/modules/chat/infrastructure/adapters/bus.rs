use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::infrastructure::EventBus;
use crate::modules::chat::domain::ChatRequestRecord;
use crate::modules::chat::ports::{BusError, RawRecord, RequestPublisher, ResponseSubscriber};

/// 请求发布适配器
pub struct BusRequestPublisher {
    bus: Arc<EventBus>,
    topic: String,
}

impl BusRequestPublisher {
    pub fn new(bus: Arc<EventBus>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl RequestPublisher for BusRequestPublisher {
    async fn publish_request(&self, record: &ChatRequestRecord) -> Result<(), BusError> {
        self.bus.publish_record(&self.topic, record).await?;
        tracing::info!(
            "[BusRequestPublisher] Sent message to {} for session {}",
            self.topic,
            record.session_id
        );
        Ok(())
    }
}

/// 响应订阅适配器
pub struct BusResponseSubscriber {
    bus: Arc<EventBus>,
    topic: String,
}

impl BusResponseSubscriber {
    pub fn new(bus: Arc<EventBus>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl ResponseSubscriber for BusResponseSubscriber {
    async fn subscribe_responses(&self) -> Result<mpsc::Receiver<RawRecord>, BusError> {
        self.bus.subscribe(&self.topic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::SessionId;

    #[tokio::test]
    async fn test_publish_request_round_trip() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe("chat-requests").await.unwrap();
        let publisher = BusRequestPublisher::new(bus.clone(), "chat-requests");

        let id = SessionId::new();
        publisher
            .publish_request(&ChatRequestRecord::new(id, "hello"))
            .await
            .unwrap();

        let raw = rx.recv().await.unwrap();
        let id_str = id.to_string();
        assert_eq!(raw.key.as_deref(), Some(id_str.as_str()));

        let decoded: ChatRequestRecord = serde_json::from_slice(&raw.payload).unwrap();
        assert_eq!(decoded.message, "hello");
    }

    #[tokio::test]
    async fn test_publish_on_closed_bus_fails() {
        let bus = Arc::new(EventBus::default());
        let publisher = BusRequestPublisher::new(bus.clone(), "chat-requests");
        bus.close().await;

        let result = publisher
            .publish_request(&ChatRequestRecord::new(SessionId::new(), "x"))
            .await;
        assert!(matches!(result, Err(BusError::Closed(_))));
    }
}
