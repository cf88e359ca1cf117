// Environment Overrides
//
// 从环境变量读取覆盖项

use crate::modules::config::domain::{
    PartialAppConfig, PartialBusConfig, PartialServerConfig,
};
use crate::modules::config::ports::ConfigError;

pub const ENV_CONFIG_PATH: &str = "CHAT_RELAY_CONFIG";
pub const ENV_HOST: &str = "CHAT_RELAY_HOST";
pub const ENV_PORT: &str = "CHAT_RELAY_PORT";
pub const ENV_LOOPBACK: &str = "CHAT_RELAY_LOOPBACK";

/// 读取进程环境变量中的覆盖项
pub fn load_env_overrides() -> Result<PartialAppConfig, ConfigError> {
    overrides_from(|key| std::env::var(key).ok())
}

/// 根据给定的查找函数构造覆盖项
pub fn overrides_from<F>(lookup: F) -> Result<PartialAppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup(ENV_HOST).filter(|v| !v.trim().is_empty());

    let port = match lookup(ENV_PORT) {
        Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
            ConfigError::Invalid(format!("{} must be a port number, got {:?}", ENV_PORT, raw))
        })?),
        None => None,
    };

    let loopback_responder = match lookup(ENV_LOOPBACK) {
        Some(raw) => Some(parse_flag(&raw).ok_or_else(|| {
            ConfigError::Invalid(format!("{} must be a boolean, got {:?}", ENV_LOOPBACK, raw))
        })?),
        None => None,
    };

    let mut partial = PartialAppConfig::default();
    if host.is_some() || port.is_some() {
        partial.server = Some(PartialServerConfig { host, port });
    }
    if loopback_responder.is_some() {
        partial.bus = Some(PartialBusConfig { loopback_responder });
    }

    Ok(partial)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
