//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use locker_shared::config::AppConfig;
use std::path::Path;

use crate::options::LockOptions;

pub const SERVICE_NAME: &str = "redis-locker";

/// Redis 分布式锁命令行工具
#[derive(Parser, Debug)]
#[command(name = "redis-locker")]
#[command(version, about = "基于 Redis 的多键分布式锁工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Redis 地址，覆盖配置文件
    #[arg(long)]
    pub redis_url: Option<String>,

    /// 键前缀，覆盖配置文件
    #[arg(long)]
    pub key_prefix: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// 加载配置并应用命令行覆盖
    ///
    /// 缺失的配置文件使用默认值；配置内容无效时返回错误，此时尚未访问 Redis。
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        let config = AppConfig::load(SERVICE_NAME).context("invalid configuration")?;
        Ok(self.apply_overrides(config))
    }

    /// 从指定目录加载配置
    pub fn load_config_from(&self, env: &str, config_dir: &Path) -> anyhow::Result<AppConfig> {
        let config =
            AppConfig::load_from(SERVICE_NAME, env, config_dir).context("invalid configuration")?;
        Ok(self.apply_overrides(config))
    }

    fn apply_overrides(&self, mut config: AppConfig) -> AppConfig {
        if let Some(url) = &self.redis_url {
            config.redis.url = url.clone();
        }
        if let Some(prefix) = &self.key_prefix {
            config.locker.key_prefix = prefix.clone();
        }
        config
    }
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 锁定一个或多个键
    Lock {
        /// 要锁定的键
        #[arg(required = true)]
        keys: Vec<String>,

        #[command(flatten)]
        args: LockArgs,
    },

    /// 按模板锁定，模板中必须包含一个 `{}`
    Pattern {
        /// 键模板，例如 `item:{}:lock`
        template: String,

        /// 替换值
        #[arg(required = true)]
        values: Vec<String>,

        #[command(flatten)]
        args: LockArgs,
    },

    /// 检查 Redis 连通性
    Ping,
}

/// 单次调用的锁参数
#[derive(Args, Debug, Clone, Default)]
pub struct LockArgs {
    /// 锁过期时间（毫秒）
    #[arg(long)]
    pub ttl_ms: Option<u64>,

    /// 锁永不过期
    #[arg(long, conflicts_with = "ttl_ms")]
    pub no_expiry: bool,

    /// 重试间隔（毫秒）
    #[arg(long)]
    pub try_delay_ms: Option<u64>,

    /// 最大尝试次数
    #[arg(long)]
    pub try_limit: Option<u32>,

    /// 获得锁后保持的时间（毫秒）
    #[arg(long, default_value = "0")]
    pub hold_ms: u64,
}

impl LockArgs {
    /// 转换为单次覆盖配置，未指定的参数沿用句柄默认值
    pub fn to_options(&self) -> LockOptions {
        let mut options = LockOptions::new();
        if let Some(ttl_ms) = self.ttl_ms {
            options = options.ttl_ms(ttl_ms);
        }
        if self.no_expiry {
            options = options.no_expiry();
        }
        if let Some(try_delay_ms) = self.try_delay_ms {
            options = options.try_delay_ms(try_delay_ms);
        }
        if let Some(try_limit) = self.try_limit {
            options = options.try_limit(try_limit);
        }
        options
    }
}
