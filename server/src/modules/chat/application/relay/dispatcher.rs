use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::modules::chat::domain::{Fragment, FragmentKind, SessionId};
use crate::modules::chat::ports::RawRecord;

use super::{RelayError, StreamingRelay};

type ShardItem = (SessionId, Fragment);

/// 按会话分片的中继调度器
///
/// 固定数量的 worker，每个 worker 独占一个有界队列。
/// 同一会话总是路由到同一 worker，因此同一会话的片段串行处理、按到达顺序投递；
/// 不同会话可以在不同 worker 上并行
pub struct RelayDispatcher {
    shards: Vec<mpsc::Sender<ShardItem>>,
    workers: Vec<JoinHandle<()>>,
}

impl RelayDispatcher {
    /// 启动 `workers` 个 worker，每个队列容量为 `capacity`
    pub fn spawn(relay: Arc<StreamingRelay>, workers: usize, capacity: usize) -> Self {
        let workers = workers.max(1);
        let mut shards = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for index in 0..workers {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            shards.push(tx);
            handles.push(tokio::spawn(run_worker(index, relay.clone(), rx)));
        }

        tracing::info!("[RelayDispatcher] Started {} relay workers", workers);

        Self {
            shards,
            workers: handles,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// 把片段交给会话所属的 worker；队列满时等待
    pub async fn dispatch(&self, session_id: SessionId, fragment: Fragment) -> Result<(), RelayError> {
        let index = session_id.shard(self.shards.len());
        self.shards[index]
            .send((session_id, fragment))
            .await
            .map_err(|_| RelayError::WorkerUnavailable(index))
    }

    /// 关闭队列并等待 worker 处理完剩余片段
    pub async fn shutdown(self) {
        drop(self.shards);
        for worker in self.workers {
            let _ = worker.await;
        }
        tracing::info!("[RelayDispatcher] All relay workers stopped");
    }
}

async fn run_worker(index: usize, relay: Arc<StreamingRelay>, mut rx: mpsc::Receiver<ShardItem>) {
    while let Some((session_id, fragment)) = rx.recv().await {
        let result = AssertUnwindSafe(relay.handle_fragment(session_id, fragment))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::error!(
                    session_id = %session_id,
                    "[RelayWorker {}] Failed to handle fragment: {}",
                    index,
                    e
                );
            }
            Err(panic) => {
                tracing::error!(
                    session_id = %session_id,
                    panic = %panic_message(panic.as_ref()),
                    "[RelayWorker {}] Fragment handler panicked",
                    index
                );
            }
        }
    }

    tracing::debug!("[RelayWorker {}] Queue closed, exiting", index);
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 启动后台消费循环
///
/// 逐条解码响应主题的记录并分派给中继 worker。单条记录出错只记录日志，循环继续；
/// 订阅结束时退出并关闭所有 worker
pub fn spawn_consumer(
    mut records: mpsc::Receiver<RawRecord>,
    dispatcher: RelayDispatcher,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            "[RelayConsumer] Consuming responses with {} workers",
            dispatcher.shard_count()
        );

        while let Some(record) = records.recv().await {
            let (session_id, fragment) = match StreamingRelay::decode(&record) {
                Ok(decoded) => decoded,
                Err(e) => {
                    tracing::warn!("[RelayConsumer] Skipping record: {}", e);
                    continue;
                }
            };

            match fragment.kind() {
                FragmentKind::Chunk => {
                    tracing::debug!(
                        session_id = %session_id,
                        "[RelayConsumer] Received chunk ({} bytes)",
                        fragment.content.len()
                    );
                }
                FragmentKind::Empty => {
                    tracing::debug!(session_id = %session_id, "[RelayConsumer] Received empty record");
                }
                kind => {
                    tracing::info!(session_id = %session_id, "[RelayConsumer] Received {:?}", kind);
                }
            }

            if let Err(e) = dispatcher.dispatch(session_id, fragment).await {
                tracing::error!(session_id = %session_id, "[RelayConsumer] {}", e);
            }
        }

        tracing::info!("[RelayConsumer] Subscription closed, stopping");
        dispatcher.shutdown().await;
    })
}

#[cfg(test)]
mod tests {
    use super::super::streaming_relay::tests::RecordingTarget;
    use super::*;
    use crate::modules::chat::domain::{ChatResponseRecord, MessageRole};
    use crate::modules::chat::infrastructure::InMemorySessionRepository;
    use crate::modules::chat::ports::{DeliveryOutcome, DeliveryTarget, SessionRepository};
    use crate::shared::ServerFrame;

    fn record(offset: u64, payload: Vec<u8>) -> RawRecord {
        RawRecord {
            topic: "chat-responses".to_string(),
            key: None,
            payload,
            offset,
        }
    }

    #[tokio::test]
    async fn test_per_session_order_across_workers() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let target = Arc::new(RecordingTarget::new(DeliveryOutcome::Queued));
        let relay = Arc::new(StreamingRelay::new(repo.clone(), target.clone()));
        let dispatcher = RelayDispatcher::spawn(relay, 4, 8);

        let mut sessions = Vec::new();
        for _ in 0..6 {
            sessions.push(repo.create().await.unwrap().session_id);
        }

        for i in 0..20 {
            for id in &sessions {
                dispatcher
                    .dispatch(*id, Fragment::chunk(format!("{},", i)))
                    .await
                    .unwrap();
            }
        }
        for id in &sessions {
            dispatcher.dispatch(*id, Fragment::done()).await.unwrap();
        }
        dispatcher.shutdown().await;

        let expected: String = (0..20).map(|i| format!("{},", i)).collect();
        for id in &sessions {
            let history = repo.history(*id).await.unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].role(), MessageRole::Assistant);
            assert_eq!(history[0].content(), expected);

            let frames = target.frames_for(*id);
            assert_eq!(frames.len(), 21);
            assert_eq!(frames[0], ServerFrame::chunk("0,"));
            assert_eq!(frames[20], ServerFrame::AssistantDone);
        }
    }

    struct PanickingTarget {
        poisoned: SessionId,
        inner: RecordingTarget,
    }

    impl DeliveryTarget for PanickingTarget {
        fn deliver(&self, session_id: SessionId, frame: ServerFrame) -> DeliveryOutcome {
            if session_id == self.poisoned {
                panic!("delivery exploded");
            }
            self.inner.deliver(session_id, frame)
        }
    }

    #[tokio::test]
    async fn test_worker_survives_panic() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let poisoned = repo.create().await.unwrap().session_id;
        let healthy = repo.create().await.unwrap().session_id;
        let target = Arc::new(PanickingTarget {
            poisoned,
            inner: RecordingTarget::new(DeliveryOutcome::Queued),
        });
        let relay = Arc::new(StreamingRelay::new(repo.clone(), target.clone()));
        // 单个 worker，两个会话共享同一队列
        let dispatcher = RelayDispatcher::spawn(relay, 1, 8);

        dispatcher.dispatch(poisoned, Fragment::direct("boom")).await.unwrap();
        dispatcher.dispatch(healthy, Fragment::direct("fine")).await.unwrap();
        dispatcher.shutdown().await;

        assert_eq!(
            target.inner.frames_for(healthy),
            vec![ServerFrame::assistant("fine")]
        );
        assert_eq!(repo.history(healthy).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_consumer_skips_malformed_records() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let target = Arc::new(RecordingTarget::new(DeliveryOutcome::Queued));
        let relay = Arc::new(StreamingRelay::new(repo.clone(), target.clone()));
        let dispatcher = RelayDispatcher::spawn(relay, 2, 8);
        let id = repo.create().await.unwrap().session_id;

        let (tx, rx) = mpsc::channel(16);
        let consumer = spawn_consumer(rx, dispatcher);

        tx.send(record(0, b"garbage".to_vec())).await.unwrap();
        tx.send(record(1, br#"{"session_id":"not-a-uuid"}"#.to_vec()))
            .await
            .unwrap();
        tx.send(record(
            2,
            serde_json::to_vec(&ChatResponseRecord::direct(id, "Hi")).unwrap(),
        ))
        .await
        .unwrap();
        drop(tx);

        consumer.await.unwrap();

        let history = repo.history(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content(), "Hi");
        assert_eq!(target.frames_for(id), vec![ServerFrame::assistant("Hi")]);
    }
}
