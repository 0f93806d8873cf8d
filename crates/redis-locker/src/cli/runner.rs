//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑：获取锁、保持、释放。

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cli::commands::LockArgs;
use crate::error::Result;
use crate::lock::Locker;
use crate::store::LockStore;

/// 一次命令执行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockReport {
    /// 释放前持有的键（已加前缀）
    pub held_keys: Vec<String>,
}

/// 命令执行器
///
/// 持有锁句柄，作为 CLI 与锁管理器之间的桥梁。
pub struct CommandRunner<S> {
    locker: Arc<Locker<S>>,
}

impl<S: LockStore> CommandRunner<S> {
    pub fn new(locker: Arc<Locker<S>>) -> Self {
        Self { locker }
    }

    /// 执行 lock 命令
    pub async fn run_lock(&self, keys: &[String], args: &LockArgs) -> Result<LockReport> {
        info!(keys = ?keys, "Locking keys");
        let outcome = self.locker.lock_with(keys, &args.to_options()).await;
        self.hold_and_release(outcome, args.hold_ms).await
    }

    /// 执行 pattern 命令
    pub async fn run_pattern(
        &self,
        template: &str,
        values: &[String],
        args: &LockArgs,
    ) -> Result<LockReport> {
        info!(template, values = ?values, "Locking pattern");
        let outcome = self
            .locker
            .lock_pattern_with(template, values, &args.to_options())
            .await;
        self.hold_and_release(outcome, args.hold_ms).await
    }

    /// 获取失败时仍然释放已获得的部分键，再返回原始错误
    async fn hold_and_release(&self, outcome: Result<()>, hold_ms: u64) -> Result<LockReport> {
        if let Err(err) = outcome {
            if let Err(release_err) = self.locker.release().await {
                warn!(error = %release_err, "Failed to release partially acquired keys");
            }
            return Err(err);
        }

        let held_keys = self.locker.held_keys();
        info!(held = held_keys.len(), hold_ms, "Locks acquired");

        if hold_ms > 0 {
            tokio::time::sleep(Duration::from_millis(hold_ms)).await;
        }

        self.locker.release().await?;
        Ok(LockReport { held_keys })
    }
}
