use std::sync::Arc;

use crate::infrastructure::EventBus;
use crate::modules::chat::domain::{ChatRequestRecord, ChatResponseRecord, SessionId};
use crate::modules::chat::ports::BusError;

const CHUNK_CHARS: usize = 5;

/// 回显后端
///
/// 用于本地开发或未接入真实流水线时的回退：订阅请求主题，
/// 把回显内容按块写回响应主题，最后发送完成标记
pub struct LoopbackResponder {
    bus: Arc<EventBus>,
    request_topic: String,
    response_topic: String,
}

impl LoopbackResponder {
    pub fn new(
        bus: Arc<EventBus>,
        request_topic: impl Into<String>,
        response_topic: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            request_topic: request_topic.into(),
            response_topic: response_topic.into(),
        }
    }

    /// 生成回复内容
    pub fn reply_for(message: &str) -> String {
        format!("Echo: {}", message)
    }

    /// 将回复切成若干块
    pub fn split_chunks(content: &str) -> Vec<String> {
        content
            .chars()
            .collect::<Vec<_>>()
            .chunks(CHUNK_CHARS)
            .map(|c| c.iter().collect::<String>())
            .collect()
    }

    /// 订阅请求主题并在后台应答
    pub async fn spawn(self) -> Result<tokio::task::JoinHandle<()>, BusError> {
        let mut rx = self.bus.subscribe(&self.request_topic).await?;
        tracing::info!(
            "[LoopbackResponder] Answering {} on {}",
            self.request_topic,
            self.response_topic
        );

        Ok(tokio::spawn(async move {
            while let Some(raw) = rx.recv().await {
                let request: ChatRequestRecord = match serde_json::from_slice(&raw.payload) {
                    Ok(request) => request,
                    Err(e) => {
                        tracing::warn!("[LoopbackResponder] Skipping malformed request: {}", e);
                        continue;
                    }
                };

                let session_id = match SessionId::parse(&request.session_id) {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::warn!(
                            "[LoopbackResponder] Skipping request with bad session id {}: {}",
                            request.session_id,
                            e
                        );
                        continue;
                    }
                };

                if let Err(e) = self.respond(session_id, &request.message).await {
                    tracing::error!("[LoopbackResponder] Failed to respond: {}", e);
                    if matches!(e, BusError::Closed(_)) {
                        break;
                    }
                }
            }
            tracing::info!("[LoopbackResponder] Stopped");
        }))
    }

    async fn respond(&self, session_id: SessionId, message: &str) -> Result<(), BusError> {
        let reply = Self::reply_for(message);
        for chunk in Self::split_chunks(&reply) {
            self.bus
                .publish_record(
                    &self.response_topic,
                    &ChatResponseRecord::chunk(session_id, chunk),
                )
                .await?;
        }
        self.bus
            .publish_record(&self.response_topic, &ChatResponseRecord::done(session_id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_chunks_keeps_content() {
        let chunks = LoopbackResponder::split_chunks("你好，世界！Hello");
        assert_eq!(chunks.concat(), "你好，世界！Hello");
        assert!(chunks.iter().all(|c| c.chars().count() <= CHUNK_CHARS));
    }

    #[tokio::test]
    async fn test_responds_with_chunks_then_done() {
        let bus = Arc::new(EventBus::default());
        let mut responses = bus.subscribe("chat-responses").await.unwrap();

        let responder =
            LoopbackResponder::new(bus.clone(), "chat-requests", "chat-responses");
        let handle = responder.spawn().await.unwrap();

        let id = SessionId::new();
        bus.publish_record("chat-requests", &ChatRequestRecord::new(id, "hi"))
            .await
            .unwrap();

        let mut text = String::new();
        loop {
            let raw = responses.recv().await.unwrap();
            let record: ChatResponseRecord = serde_json::from_slice(&raw.payload).unwrap();
            assert_eq!(record.session_id, id.to_string());
            if record.is_done {
                break;
            }
            assert!(record.is_chunk);
            text.push_str(&record.response);
        }
        assert_eq!(text, "Echo: hi");

        handle.abort();
    }
}
