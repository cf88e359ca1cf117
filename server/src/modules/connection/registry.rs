use dashmap::DashMap;

use super::domain::{ConnectionHandle, ConnectionId};
use crate::modules::chat::domain::SessionId;
use crate::modules::chat::ports::{DeliveryOutcome, DeliveryTarget};
use crate::shared::ServerFrame;

/// 连接注册表
///
/// 每个会话最多一个在线连接，后注册者覆盖先注册者
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<SessionId, ConnectionHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 绑定连接，返回被替换的旧连接
    ///
    /// 旧连接不会被关闭，只是不再收到中继投递
    pub fn register(&self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let session_id = handle.session_id();
        let connection_id = handle.id();
        let previous = self.connections.insert(session_id, handle);

        match &previous {
            Some(old) => tracing::info!(
                session_id = %session_id,
                "[ConnectionRegistry] {} replaced {}",
                connection_id,
                old.id()
            ),
            None => tracing::info!(
                session_id = %session_id,
                "[ConnectionRegistry] Registered {}",
                connection_id
            ),
        }

        previous
    }

    /// 仅当绑定仍然指向该连接时移除
    pub fn unregister(&self, session_id: SessionId, connection_id: &ConnectionId) -> bool {
        let removed = self
            .connections
            .remove_if(&session_id, |_, handle| handle.id() == *connection_id)
            .is_some();

        if removed {
            tracing::info!(
                session_id = %session_id,
                "[ConnectionRegistry] Unregistered {}",
                connection_id
            );
        } else {
            tracing::debug!(
                session_id = %session_id,
                "[ConnectionRegistry] Stale unregister of {} ignored",
                connection_id
            );
        }

        removed
    }

    pub fn lookup(&self, session_id: SessionId) -> Option<ConnectionHandle> {
        self.connections
            .get(&session_id)
            .map(|entry| entry.value().clone())
    }

    /// 在线连接数量
    pub fn count(&self) -> usize {
        self.connections.len()
    }
}

impl DeliveryTarget for ConnectionRegistry {
    fn deliver(&self, session_id: SessionId, frame: ServerFrame) -> DeliveryOutcome {
        match self.connections.get(&session_id) {
            Some(entry) => entry.value().try_send(frame),
            None => DeliveryOutcome::NoConnection,
        }
    }
}
