//! Redis 分布式锁命令行入口
//!
//! 加载配置、初始化可观测性后执行子命令。

use anyhow::{Context, Result};
use clap::Parser;
use locker_shared::observability;
use std::sync::Arc;
use tracing::{info, warn};

use redis_locker::{
    cli::{Cli, CommandRunner, Commands, SERVICE_NAME},
    LockOptions, Locker, RedisLockStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. 加载配置，缺失的配置文件使用默认值，内容无效则直接退出
    let config = cli.load_config()?;

    // 2. 初始化可观测性
    let obs_config = config.observability.clone().with_service_name(SERVICE_NAME);
    let _guard = observability::init(&obs_config)?;

    info!(
        environment = %config.environment,
        redis_url = %config.redis.url,
        "Starting {}", SERVICE_NAME
    );

    // 3. 构建锁句柄
    let store = Arc::new(RedisLockStore::new(&config.redis).context("invalid redis url")?);
    let locker = Locker::new(store.clone(), &LockOptions::from(&config.locker))
        .context("invalid locker settings")?
        .with_key_prefix(config.locker.key_prefix.clone());
    let runner = CommandRunner::new(Arc::new(locker));

    match cli.command {
        Commands::Lock { keys, args } => {
            let report = runner.run_lock(&keys, &args).await?;
            println!("locked and released: {}", report.held_keys.join(", "));
        }
        Commands::Pattern {
            template,
            values,
            args,
        } => {
            let report = runner.run_pattern(&template, &values, &args).await?;
            println!("locked and released: {}", report.held_keys.join(", "));
        }
        Commands::Ping => {
            if let Err(e) = store.health_check().await {
                warn!(error = %e, "Redis health check failed");
                return Err(e.into());
            }
            println!("PONG");
        }
    }

    Ok(())
}
