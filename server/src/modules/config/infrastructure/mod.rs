// Config Infrastructure Layer
//
// 配置模块的基础设施实现

pub mod env_overrides;
pub mod file_repository;
pub mod memory_repository;

pub use env_overrides::*;
pub use file_repository::*;
pub use memory_repository::*;
