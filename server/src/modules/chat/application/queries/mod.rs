// Chat Queries - 查询定义和处理器

mod get_session;
mod list_messages;
mod list_sessions;

pub use get_session::*;
pub use list_messages::*;
pub use list_sessions::*;
