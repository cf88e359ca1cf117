// Config Application Layer
//
// 应用层负责加载、合并覆盖项并校验配置

pub mod service;

pub use service::*;
