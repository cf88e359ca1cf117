// Streaming Relay - 流式中继
// 后台消费响应主题，按会话分片交给中继 worker，累积片段、提交历史并投递给在线连接

mod dispatcher;
mod streaming_relay;

pub use dispatcher::*;
pub use streaming_relay::*;

use thiserror::Error;

use super::super::ports::RepositoryError;

/// 中继错误类型
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: u64, reason: String },

    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),

    #[error("Relay worker {0} is not running")]
    WorkerUnavailable(usize),
}
