use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::modules::chat::domain::SessionId;
use crate::modules::chat::ports::DeliveryOutcome;
use crate::shared::ServerFrame;

/// 连接唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn_{}", self.0.simple())
    }
}

/// 连接句柄
///
/// 绑定到一个会话的出站通道。所有发往客户端的帧都进入同一个有界队列，
/// 由连接自己的写任务按顺序写出
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    session_id: SessionId,
    tx: mpsc::Sender<ServerFrame>,
}

impl ConnectionHandle {
    pub fn new(session_id: SessionId, tx: mpsc::Sender<ServerFrame>) -> Self {
        Self {
            id: ConnectionId::new(),
            session_id,
            tx,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// 非阻塞入队，队列满或已关闭时丢弃
    pub fn try_send(&self, frame: ServerFrame) -> DeliveryOutcome {
        match self.tx.try_send(frame) {
            Ok(()) => DeliveryOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => DeliveryOutcome::QueueFull,
            Err(mpsc::error::TrySendError::Closed(_)) => DeliveryOutcome::Closed,
        }
    }

    /// 入队并在队列满时等待，写任务已退出时返回 false
    pub async fn send(&self, frame: ServerFrame) -> bool {
        self.tx.send(frame).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
