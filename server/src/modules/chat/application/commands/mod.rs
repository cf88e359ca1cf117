// Chat Commands - 命令定义和处理器

mod create_session;
mod delete_session;
mod send_message;

pub use create_session::*;
pub use delete_session::*;
pub use send_message::*;
