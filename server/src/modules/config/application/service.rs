// Config Service
//
// 配置服务门面，提供统一的 API

use std::sync::Arc;

use crate::modules::config::domain::{AppConfig, PartialAppConfig};
use crate::modules::config::ports::{ConfigError, ConfigRepository};

/// 配置服务实现
pub struct ConfigService {
    repository: Arc<dyn ConfigRepository>,
}

impl ConfigService {
    pub fn new(repository: Arc<dyn ConfigRepository>) -> Self {
        Self { repository }
    }

    /// 获取仓储引用
    pub fn repository(&self) -> &Arc<dyn ConfigRepository> {
        &self.repository
    }

    /// 读取已保存的配置（不含覆盖项，不校验）
    pub async fn get_all(&self) -> Result<AppConfig, ConfigError> {
        self.repository.load().await
    }

    /// 加载配置、合并覆盖项并校验
    pub async fn resolve(&self, overrides: PartialAppConfig) -> Result<AppConfig, ConfigError> {
        let mut config = self.repository.load().await?;
        config.merge(overrides);

        config
            .validate()
            .map_err(|errors| ConfigError::ValidationError { errors })?;

        Ok(config)
    }

    /// 校验并保存配置
    pub async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        config
            .validate()
            .map_err(|errors| ConfigError::ValidationError { errors })?;
        self.repository.save(config).await
    }
}
