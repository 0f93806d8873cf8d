//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::observability::ObservabilityConfig;

/// Redis 配置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
        }
    }
}

/// 锁默认参数
///
/// 数值字段为无符号整数，负数或非整数在反序列化阶段即被拒绝；
/// 零值由锁配置校验拒绝。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockerSettings {
    /// 锁过期时间（毫秒），不配置表示永不过期
    pub ttl_ms: Option<u64>,
    pub try_delay_ms: u64,
    pub try_limit: u32,
    pub key_prefix: String,
}

impl Default for LockerSettings {
    fn default() -> Self {
        Self {
            ttl_ms: None,
            try_delay_ms: 25,
            try_limit: 10,
            key_prefix: "locker:".to_string(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub redis: RedisConfig,
    pub locker: LockerSettings,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（LOCKER_ 前缀，双下划线分隔层级，如 LOCKER_REDIS__URL -> redis.url）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("LOCKER_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(service_name, &env, Path::new(&config_dir))
    }

    /// 从指定目录加载配置
    pub fn load_from(service_name: &str, env: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            // 环境变量覆盖（LOCKER_LOCKER__TRY_LIMIT -> locker.try_limit）
            .add_source(
                Environment::with_prefix("LOCKER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.observability.service_name = config.service_name.clone();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_config_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("locker-config-{}-{}", name, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.redis.url, "redis://localhost:6379");
        assert_eq!(config.locker.try_delay_ms, 25);
        assert_eq!(config.locker.try_limit, 10);
        assert_eq!(config.locker.ttl_ms, None);
        assert_eq!(config.locker.key_prefix, "locker:");
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = temp_config_dir("empty");
        let config = AppConfig::load_from("redis-locker", "test", &dir).unwrap();

        assert_eq!(config.service_name, "redis-locker");
        assert_eq!(config.environment, "test");
        assert_eq!(config.observability.service_name, "redis-locker");
        assert_eq!(config.locker.try_limit, 10);
    }

    #[test]
    fn test_layered_files_override() {
        let dir = temp_config_dir("layered");
        fs::write(
            dir.join("default.toml"),
            "[locker]\ntry_limit = 5\ntry_delay_ms = 50\n\n[redis]\nurl = \"redis://cache:6379\"\n",
        )
        .unwrap();
        fs::write(dir.join("redis-locker.toml"), "[locker]\nttl_ms = 30000\ntry_limit = 3\n").unwrap();

        let config = AppConfig::load_from("redis-locker", "test", &dir).unwrap();
        assert_eq!(config.locker.try_limit, 3);
        assert_eq!(config.locker.try_delay_ms, 50);
        assert_eq!(config.locker.ttl_ms, Some(30_000));
        assert_eq!(config.redis.url, "redis://cache:6379");
    }

    #[test]
    fn test_wrong_type_rejected() {
        let dir = temp_config_dir("invalid");
        fs::write(dir.join("default.toml"), "[locker]\ntry_delay_ms = \"soon\"\n").unwrap();
        assert!(AppConfig::load_from("redis-locker", "test", &dir).is_err());
    }
}
