// Chat Infrastructure - Repositories
//
// 仓储实现：
// - InMemorySessionRepository: 内存仓储，进程重启后不保留

mod in_memory_session_repository;

pub use in_memory_session_repository::*;
