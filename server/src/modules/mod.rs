// Modules Layer - 业务模块
//
// 按照六边形架构组织的业务模块：
// - chat: 聊天模块，处理会话、消息和流式中继
// - config: 配置模块，处理应用设置
// - connection: 连接模块，管理客户端实时连接

pub mod chat;
pub mod config;
pub mod connection;

pub use chat::ChatModule;
pub use config::ConfigModule;
pub use connection::{ConnectionHandler, ConnectionRegistry};
