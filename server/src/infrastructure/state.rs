use std::sync::Arc;

use crate::modules::{ChatModule, ConnectionHandler, ConnectionRegistry};

/// 应用全局状态
///
/// 所有组件在启动时构造并注入，HTTP 层通过 axum State 共享
#[derive(Clone)]
pub struct AppState {
    pub chat_module: Arc<ChatModule>,
    pub connection_registry: Arc<ConnectionRegistry>,
    pub connection_handler: Arc<ConnectionHandler>,
}

impl AppState {
    pub fn new(
        chat_module: Arc<ChatModule>,
        connection_registry: Arc<ConnectionRegistry>,
        connection_handler: Arc<ConnectionHandler>,
    ) -> Self {
        Self {
            chat_module,
            connection_registry,
            connection_handler,
        }
    }
}
