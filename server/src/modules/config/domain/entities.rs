// Config Domain Entities
//
// 配置领域实体定义

use serde::{Deserialize, Serialize};

/// HTTP / WebSocket 监听配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// 事件总线配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusConfig {
    /// 用户消息发往后端的主题
    pub request_topic: String,
    /// 后端回复片段所在的主题
    pub response_topic: String,
    /// 每个订阅者的队列容量
    pub channel_capacity: usize,
    pub publish_timeout_ms: u64,
    /// 启用内置回显后端
    pub loopback_responder: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            request_topic: "chat-requests".to_string(),
            response_topic: "chat-responses".to_string(),
            channel_capacity: 1024,
            publish_timeout_ms: 10_000,
            loopback_responder: false,
        }
    }
}

/// 中继配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayConfig {
    pub workers: usize,
    pub shard_queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            shard_queue_capacity: 256,
        }
    }
}

/// 客户端连接配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
    pub send_queue_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            send_queue_capacity: 256,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// EnvFilter 指令，RUST_LOG 优先
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// 应用配置聚合根
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub bus: BusConfig,
    pub relay: RelayConfig,
    pub connection: ConnectionConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 创建新的默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并部分配置更新
    pub fn merge(&mut self, partial: PartialAppConfig) {
        if let Some(server) = partial.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(bus) = partial.bus {
            if let Some(loopback_responder) = bus.loopback_responder {
                self.bus.loopback_responder = loopback_responder;
            }
        }

        if let Some(logging) = partial.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.trim().is_empty() {
            errors.push("Server host cannot be empty".to_string());
        }

        // 验证主题
        if self.bus.request_topic.trim().is_empty() {
            errors.push("Request topic cannot be empty".to_string());
        }
        if self.bus.response_topic.trim().is_empty() {
            errors.push("Response topic cannot be empty".to_string());
        }
        if self.bus.request_topic == self.bus.response_topic {
            errors.push("Request and response topics must differ".to_string());
        }

        // 验证队列容量
        if self.bus.channel_capacity == 0 {
            errors.push("Bus channel capacity must be at least 1".to_string());
        }
        if self.bus.publish_timeout_ms == 0 {
            errors.push("Publish timeout must be at least 1ms".to_string());
        }
        if self.relay.workers == 0 {
            errors.push("Relay needs at least one worker".to_string());
        }
        if self.relay.shard_queue_capacity == 0 {
            errors.push("Relay shard queue capacity must be at least 1".to_string());
        }
        if self.connection.send_queue_capacity == 0 {
            errors.push("Connection send queue capacity must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// 部分配置更新（用于合并环境变量覆盖）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartialAppConfig {
    pub server: Option<PartialServerConfig>,
    pub bus: Option<PartialBusConfig>,
    pub logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartialServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartialBusConfig {
    pub loopback_responder: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartialLoggingConfig {
    pub level: Option<String>,
}
