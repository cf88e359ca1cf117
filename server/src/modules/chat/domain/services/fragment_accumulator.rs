use dashmap::DashMap;

use super::super::value_objects::{Fragment, FragmentKind, SessionId};

/// 会话的流式状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Idle,
    Streaming,
}

/// 累积器对单个片段的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccumulatorEvent {
    /// 增量文本，立即转发
    Partial(String),
    /// 流结束；缓冲区非空时携带完整内容
    Completed(Option<String>),
    /// 非流式的完整回复
    Direct(String),
}

#[derive(Debug, Default)]
struct SessionBuffer {
    text: String,
    state: StreamState,
}

/// 片段累积器
///
/// 将某个会话的有序片段流还原为完整的助手消息。
/// 每个会话一个缓冲区，完成后清空复用而不是删除。
///
/// 不同会话可以并发调用；同一会话的调用必须串行（由中继的分片调度保证）
#[derive(Debug, Default)]
pub struct FragmentAccumulator {
    buffers: DashMap<SessionId, SessionBuffer>,
}

impl FragmentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理一个片段，返回需要提交或转发的事件
    ///
    /// 从不因片段形态异常而报错，未知组合不产生任何事件
    pub fn ingest(&self, session_id: SessionId, fragment: &Fragment) -> Vec<AccumulatorEvent> {
        match fragment.kind() {
            FragmentKind::Chunk => self.append(session_id, &fragment.content).into_iter().collect(),
            FragmentKind::Done => vec![self.complete(session_id)],
            FragmentKind::FinalChunk => {
                let mut events: Vec<AccumulatorEvent> =
                    self.append(session_id, &fragment.content).into_iter().collect();
                events.push(self.complete(session_id));
                events
            }
            FragmentKind::Direct => vec![AccumulatorEvent::Direct(fragment.content.clone())],
            FragmentKind::Empty => Vec::new(),
        }
    }

    fn append(&self, session_id: SessionId, content: &str) -> Option<AccumulatorEvent> {
        if content.is_empty() {
            return None;
        }

        let mut buffer = self.buffers.entry(session_id).or_default();
        buffer.text.push_str(content);
        buffer.state = StreamState::Streaming;

        Some(AccumulatorEvent::Partial(content.to_string()))
    }

    fn complete(&self, session_id: SessionId) -> AccumulatorEvent {
        let content = self.buffers.get_mut(&session_id).and_then(|mut buffer| {
            buffer.state = StreamState::Idle;
            let text = std::mem::take(&mut buffer.text);
            (!text.is_empty()).then_some(text)
        });

        AccumulatorEvent::Completed(content)
    }

    /// 当前流式状态
    pub fn state(&self, session_id: SessionId) -> StreamState {
        self.buffers
            .get(&session_id)
            .map(|buffer| buffer.state)
            .unwrap_or_default()
    }

    /// 当前已累积的内容
    pub fn buffered(&self, session_id: SessionId) -> Option<String> {
        self.buffers.get(&session_id).map(|buffer| buffer.text.clone())
    }

    /// 处于流式状态的会话数量
    pub fn streaming_sessions(&self) -> usize {
        self.buffers
            .iter()
            .filter(|entry| entry.value().state == StreamState::Streaming)
            .count()
    }

    /// 丢弃某个会话的缓冲区（会话被删除时）
    pub fn discard(&self, session_id: SessionId) -> bool {
        self.buffers.remove(&session_id).is_some()
    }
}
