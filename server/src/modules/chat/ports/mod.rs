// Chat Ports Layer
// 端口定义了模块与外部世界的接口

mod delivery_port;
mod event_bus_port;
mod session_repository;

pub use delivery_port::*;
pub use event_bus_port::*;
pub use session_repository::*;
