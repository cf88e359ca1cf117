// Connection Module - 连接模块
//
// 管理客户端实时连接：
// - domain: 连接标识和连接句柄（有界发送队列）
// - registry: 会话到在线连接的映射，实现中继的投递端口
// - handler: 单个连接的生命周期（校验、注册、读写任务、注销）

pub mod domain;
pub mod handler;
pub mod registry;

pub use domain::{ConnectionHandle, ConnectionId};
pub use handler::ConnectionHandler;
pub use registry::ConnectionRegistry;
