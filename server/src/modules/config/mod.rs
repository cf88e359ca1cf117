// Config Module
//
// 配置管理模块，采用六边形架构
//
// 层次结构:
// - domain: 领域层，包含配置实体和校验规则
// - ports: 端口层，定义配置读写的抽象接口
// - infrastructure: 基础设施层，实现文件/内存仓储和环境变量覆盖
// - application: 应用层，合并覆盖项并校验

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// 重新导出常用类型

// Domain
pub use domain::{
    AppConfig, BusConfig, ConnectionConfig, LoggingConfig, PartialAppConfig, PartialBusConfig,
    PartialLoggingConfig, PartialServerConfig, RelayConfig, ServerConfig,
};

// Ports
pub use ports::{ConfigError, ConfigRepository};

// Infrastructure
pub use infrastructure::{
    load_env_overrides, FileConfigRepository, InMemoryConfigRepository, DEFAULT_CONFIG_FILE,
    ENV_CONFIG_PATH,
};

// Application
pub use application::ConfigService;

use std::sync::Arc;

/// Config 模块容器
///
/// 管理模块内的依赖注入
pub struct ConfigModule {
    service: ConfigService,
}

impl ConfigModule {
    /// 使用内存仓储创建（用于测试）
    pub fn new_in_memory() -> Self {
        Self::with_repository(Arc::new(InMemoryConfigRepository::new()))
    }

    /// 使用 JSON 文件创建
    pub fn new_with_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::with_repository(Arc::new(FileConfigRepository::new(path)))
    }

    /// 配置文件路径取自 CHAT_RELAY_CONFIG，缺省为 config.json
    pub fn from_env() -> Self {
        let path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::new_with_file(path)
    }

    /// 使用自定义仓储创建
    pub fn with_repository(repository: Arc<dyn ConfigRepository>) -> Self {
        Self {
            service: ConfigService::new(repository),
        }
    }

    /// 获取配置服务
    pub fn service(&self) -> &ConfigService {
        &self.service
    }

    /// 加载最终生效的配置（文件 + 环境变量覆盖 + 校验）
    pub async fn load(&self) -> Result<AppConfig, ConfigError> {
        let overrides = load_env_overrides()?;
        self.service.resolve(overrides).await
    }
}
