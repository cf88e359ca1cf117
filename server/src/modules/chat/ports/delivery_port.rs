use crate::modules::chat::domain::SessionId;
use crate::shared::ServerFrame;

/// 投递结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 已放入连接的发送队列
    Queued,
    /// 会话没有在线连接
    NoConnection,
    /// 发送队列已满，丢弃
    QueueFull,
    /// 连接已关闭，丢弃
    Closed,
}

impl DeliveryOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, DeliveryOutcome::Queued)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DeliveryOutcome::QueueFull | DeliveryOutcome::Closed)
    }
}

/// 投递端口
///
/// 由连接注册表实现。调用方不等待真正的写出，只负责把帧交给连接自己的写任务，
/// 因此不会阻塞在客户端 I/O 上
pub trait DeliveryTarget: Send + Sync {
    fn deliver(&self, session_id: SessionId, frame: ServerFrame) -> DeliveryOutcome;
}
