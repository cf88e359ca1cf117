use std::sync::Arc;

use dashmap::DashSet;

use crate::modules::chat::domain::{
    AccumulatorEvent, ChatResponseRecord, Fragment, FragmentAccumulator, Message, MessageRole,
    SessionId,
};
use crate::modules::chat::ports::{
    DeliveryOutcome, DeliveryTarget, RawRecord, RepositoryError, SessionRepository,
};
use crate::shared::ServerFrame;

use super::RelayError;

/// 单个片段的处理结果
#[derive(Debug, Clone, Default)]
pub struct RelayOutcome {
    /// 本次提交到历史的助手消息
    pub committed: Option<Message>,
    /// 每一帧的投递结果，按发送顺序
    pub deliveries: Vec<DeliveryOutcome>,
}

/// 流式中继
///
/// 把响应片段交给累积器，提交完成的助手消息，再把增量和完成信号投递给会话的在线连接。
/// 投递只是放入连接自己的发送队列，不等待客户端写出。
///
/// 某个增量因发送队列已满被丢弃后，该流标记为降级：后续增量不再转发，
/// 流结束时改为发送一条完整的 `assistant` 帧，客户端不会拼出缺字的消息。
///
/// 同一会话的片段必须串行调用 `handle_fragment`，由 [`super::RelayDispatcher`] 的分片保证
pub struct StreamingRelay {
    accumulator: FragmentAccumulator,
    session_repository: Arc<dyn SessionRepository>,
    delivery: Arc<dyn DeliveryTarget>,
    degraded: DashSet<SessionId>,
}

impl StreamingRelay {
    pub fn new(
        session_repository: Arc<dyn SessionRepository>,
        delivery: Arc<dyn DeliveryTarget>,
    ) -> Self {
        Self {
            accumulator: FragmentAccumulator::new(),
            session_repository,
            delivery,
            degraded: DashSet::new(),
        }
    }

    /// 解码总线上的原始响应记录
    pub fn decode(record: &RawRecord) -> Result<(SessionId, Fragment), RelayError> {
        let response: ChatResponseRecord =
            serde_json::from_slice(&record.payload).map_err(|e| RelayError::MalformedRecord {
                offset: record.offset,
                reason: e.to_string(),
            })?;

        response
            .into_fragment()
            .map_err(|e| RelayError::MalformedRecord {
                offset: record.offset,
                reason: format!("invalid session_id: {}", e),
            })
    }

    /// 处理一个片段
    pub async fn handle_fragment(
        &self,
        session_id: SessionId,
        fragment: Fragment,
    ) -> Result<RelayOutcome, RelayError> {
        let mut outcome = RelayOutcome::default();

        for event in self.accumulator.ingest(session_id, &fragment) {
            match event {
                AccumulatorEvent::Partial(chunk) => {
                    if self.degraded.contains(&session_id) {
                        tracing::debug!(
                            session_id = %session_id,
                            "[StreamingRelay] Stream degraded, holding chunk until done"
                        );
                        continue;
                    }

                    let delivery = self.deliver(session_id, ServerFrame::chunk(chunk));
                    if delivery == DeliveryOutcome::QueueFull {
                        self.degraded.insert(session_id);
                    }
                    outcome.deliveries.push(delivery);
                }
                AccumulatorEvent::Completed(content) => {
                    if let Some(content) = content {
                        outcome.committed = self.commit(session_id, content).await?;
                    }

                    let degraded = self.degraded.remove(&session_id).is_some();
                    let frame = match (&outcome.committed, degraded) {
                        (Some(message), true) => {
                            tracing::info!(
                                session_id = %session_id,
                                "[StreamingRelay] Resending degraded stream as one message"
                            );
                            ServerFrame::assistant(message.content())
                        }
                        _ => ServerFrame::AssistantDone,
                    };
                    outcome.deliveries.push(self.deliver(session_id, frame));
                }
                AccumulatorEvent::Direct(content) => {
                    outcome.committed = self.commit(session_id, content.clone()).await?;
                    outcome
                        .deliveries
                        .push(self.deliver(session_id, ServerFrame::assistant(content)));
                }
            }
        }

        Ok(outcome)
    }

    async fn commit(
        &self,
        session_id: SessionId,
        content: String,
    ) -> Result<Option<Message>, RelayError> {
        match self
            .session_repository
            .append(session_id, MessageRole::Assistant, content)
            .await
        {
            Ok(message) => {
                tracing::info!(
                    session_id = %session_id,
                    "[StreamingRelay] Committed assistant message ({} chars)",
                    message.content().chars().count()
                );
                Ok(Some(message))
            }
            Err(RepositoryError::NotFound(_)) => {
                // 会话已被删除，丢弃其缓冲区
                tracing::warn!(
                    session_id = %session_id,
                    "[StreamingRelay] Session no longer exists, dropping response"
                );
                self.accumulator.discard(session_id);
                self.degraded.remove(&session_id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn deliver(&self, session_id: SessionId, frame: ServerFrame) -> DeliveryOutcome {
        let kind = frame.kind();
        let outcome = self.delivery.deliver(session_id, frame);

        match outcome {
            DeliveryOutcome::Queued => {
                tracing::debug!(session_id = %session_id, "[StreamingRelay] Queued {}", kind);
            }
            DeliveryOutcome::NoConnection => {
                tracing::debug!(
                    session_id = %session_id,
                    "[StreamingRelay] No active connection, dropped {}",
                    kind
                );
            }
            DeliveryOutcome::QueueFull | DeliveryOutcome::Closed => {
                tracing::warn!(
                    session_id = %session_id,
                    "[StreamingRelay] Failed to deliver {}: {:?}",
                    kind,
                    outcome
                );
            }
        }

        outcome
    }

    pub fn accumulator(&self) -> &FragmentAccumulator {
        &self.accumulator
    }

    /// 当前流是否因丢弃增量而降级
    pub fn is_degraded(&self, session_id: SessionId) -> bool {
        self.degraded.contains(&session_id)
    }
}
