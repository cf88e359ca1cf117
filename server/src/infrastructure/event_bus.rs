use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};

use crate::modules::chat::domain::BusRecord;
use crate::modules::chat::ports::{BusError, RawRecord};

#[derive(Default)]
struct TopicState {
    subscribers: Vec<mpsc::Sender<RawRecord>>,
    next_offset: u64,
}

/// 进程内事件总线
///
/// 按主题发布/订阅原始 JSON 负载。每个订阅者按发布顺序收到订阅之后的全部记录，
/// 同一主题的发布串行进行，因此同一键的记录天然有序。
/// 没有订阅者时记录直接丢弃。
///
/// 发布对多个订阅者不是原子的：只要有一个订阅者收到记录即视为成功，
/// 超时的订阅者会错过这条记录并记录警告。所有订阅者都超时才返回 `Timeout`。
pub struct EventBus {
    topics: DashMap<String, Arc<Mutex<TopicState>>>,
    closed: AtomicBool,
    capacity: usize,
    publish_timeout: Duration,
}

impl EventBus {
    pub fn new(capacity: usize, publish_timeout: Duration) -> Self {
        Self {
            topics: DashMap::new(),
            closed: AtomicBool::new(false),
            capacity: capacity.max(1),
            publish_timeout,
        }
    }

    fn topic(&self, name: &str) -> Arc<Mutex<TopicState>> {
        self.topics
            .entry(name.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// 订阅主题
    pub async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<RawRecord>, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed(topic.to_string()));
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        let state = self.topic(topic);
        state.lock().await.subscribers.push(tx);

        tracing::info!("[EventBus] New subscriber on topic {}", topic);
        Ok(rx)
    }

    /// 发布原始负载，返回分配的偏移量
    pub async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: Vec<u8>,
    ) -> Result<u64, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed(topic.to_string()));
        }

        let topic_state = self.topic(topic);
        let mut state = topic_state.lock().await;

        let offset = state.next_offset;
        state.next_offset += 1;

        let record = RawRecord {
            topic: topic.to_string(),
            key: key.map(str::to_string),
            payload,
            offset,
        };

        let subscribers = std::mem::take(&mut state.subscribers);
        let mut alive = Vec::with_capacity(subscribers.len());
        let mut delivered = 0usize;
        let mut timed_out = 0usize;
        for subscriber in subscribers {
            match tokio::time::timeout(self.publish_timeout, subscriber.send(record.clone())).await
            {
                Ok(Ok(())) => {
                    delivered += 1;
                    alive.push(subscriber);
                }
                Ok(Err(_)) => {
                    tracing::debug!("[EventBus] Dropping closed subscriber on {}", topic);
                }
                Err(_) => {
                    // 超时的订阅者保留，只错过这一条
                    tracing::warn!(
                        "[EventBus] Slow subscriber on {} missed offset {}",
                        topic,
                        offset
                    );
                    alive.push(subscriber);
                    timed_out += 1;
                }
            }
        }
        state.subscribers = alive;

        if timed_out > 0 && delivered == 0 {
            return Err(BusError::Timeout {
                topic: topic.to_string(),
                timeout_ms: self.publish_timeout.as_millis() as u64,
            });
        }

        tracing::debug!(
            "[EventBus] Published offset {} to {} (key={:?})",
            offset,
            topic,
            key
        );
        Ok(offset)
    }

    /// 序列化并发布一条记录，以记录的键作为分区键
    pub async fn publish_record<R: BusRecord>(
        &self,
        topic: &str,
        record: &R,
    ) -> Result<u64, BusError> {
        let payload =
            serde_json::to_vec(record).map_err(|e| BusError::Serialization(e.to_string()))?;
        self.publish(topic, Some(record.key()), payload).await
    }

    /// 关闭总线：之后的发布失败，现有订阅结束
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let topics: Vec<Arc<Mutex<TopicState>>> =
            self.topics.iter().map(|entry| entry.value().clone()).collect();
        for state in topics {
            state.lock().await.subscribers.clear();
        }

        tracing::info!("[EventBus] Closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024, Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe("responses").await.unwrap();

        for i in 0..5u8 {
            bus.publish("responses", Some("k"), vec![i]).await.unwrap();
        }

        for i in 0..5u8 {
            let record = rx.recv().await.unwrap();
            assert_eq!(record.payload, vec![i]);
            assert_eq!(record.offset, i as u64);
            assert_eq!(record.key.as_deref(), Some("k"));
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscriber_is_dropped() {
        let bus = EventBus::default();
        bus.publish("requests", None, b"lost".to_vec()).await.unwrap();

        let mut rx = bus.subscribe("requests").await.unwrap();
        bus.publish("requests", None, b"kept".to_vec()).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().payload, b"kept".to_vec());
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let bus = EventBus::default();
        let mut a = bus.subscribe("a").await.unwrap();
        let _b = bus.subscribe("b").await.unwrap();

        bus.publish("b", None, vec![1]).await.unwrap();
        bus.publish("a", None, vec![2]).await.unwrap();

        assert_eq!(a.recv().await.unwrap().payload, vec![2]);
    }

    #[tokio::test]
    async fn test_closed_bus_rejects_publish() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe("t").await.unwrap();

        bus.close().await;

        assert!(matches!(
            bus.publish("t", None, vec![]).await,
            Err(BusError::Closed(_))
        ));
        assert!(rx.recv().await.is_none());
        assert!(bus.subscribe("t").await.is_err());
    }

    #[tokio::test]
    async fn test_full_subscriber_times_out() {
        let bus = EventBus::new(1, Duration::from_millis(20));
        let _rx = bus.subscribe("t").await.unwrap();

        bus.publish("t", None, vec![1]).await.unwrap();
        let result = bus.publish("t", None, vec![2]).await;

        assert!(matches!(result, Err(BusError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_slow_subscriber_does_not_fail_publish() {
        let bus = EventBus::new(1, Duration::from_millis(20));
        let mut fast = bus.subscribe("t").await.unwrap();
        let mut slow = bus.subscribe("t").await.unwrap();

        bus.publish("t", None, vec![1]).await.unwrap();
        assert_eq!(fast.recv().await.unwrap().payload, vec![1]);

        // slow 的队列仍满，fast 已腾出空间
        let offset = bus.publish("t", None, vec![2]).await.unwrap();
        assert_eq!(offset, 1);
        assert_eq!(fast.recv().await.unwrap().payload, vec![2]);

        assert_eq!(slow.recv().await.unwrap().payload, vec![1]);
        bus.publish("t", None, vec![3]).await.unwrap();
        assert_eq!(slow.recv().await.unwrap().payload, vec![3]);
    }
}
