//! 多键锁管理器
//!
//! 每次尝试把所有待锁定键打包成一个批次提交，只对仍被占用的键重试，
//! 已获得的键累积到句柄的持有集合中，直到显式 `release()`。

use locker_shared::observability::metrics;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{LockError, Result};
use crate::options::{LockConfig, LockOptions};
use crate::pattern::KeyPattern;
use crate::store::{LockStore, RedisLockStore, SetOutcome};

/// 默认键前缀，隔离同一存储中的其他数据
pub const DEFAULT_KEY_PREFIX: &str = "locker:";

/// 基于 Redis 的锁句柄
pub type RedisLocker = Locker<RedisLockStore>;

/// 锁句柄
///
/// 持有一份配置快照和当前持有的键集合（已加前缀）。
/// 同一句柄可以被多个任务并发调用，持有集合由互斥锁保护，且不会跨 await 持有。
pub struct Locker<S> {
    store: Arc<S>,
    config: LockConfig,
    key_prefix: String,
    held: Mutex<BTreeSet<String>>,
    /// 句柄唯一标识，仅用于日志关联
    instance_id: String,
}

impl<S: LockStore> Locker<S> {
    /// 创建锁句柄
    ///
    /// `options` 无效时返回 `InvalidConfiguration`，此时不会访问存储。
    pub fn new(store: Arc<S>, options: &LockOptions) -> Result<Self> {
        let config = LockConfig::from_options(options)?;
        Ok(Self::with_config(store, config))
    }

    /// 使用默认配置创建锁句柄
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::with_config(store, LockConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: LockConfig) -> Self {
        Self {
            store,
            config,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            held: Mutex::new(BTreeSet::new()),
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// 替换键前缀
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// 当前持有的键（已加前缀，按字典序）
    pub fn held_keys(&self) -> Vec<String> {
        self.held.lock().iter().cloned().collect()
    }

    /// 逻辑键是否由本句柄持有
    pub fn is_held(&self, key: &str) -> bool {
        self.held.lock().contains(&self.namespaced(key))
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// 使用句柄默认配置锁定所有键
    pub async fn lock<K: AsRef<str>>(&self, keys: &[K]) -> Result<()> {
        self.acquire(dedup(keys), &self.config).await
    }

    /// 使用单次覆盖配置锁定所有键
    ///
    /// 覆盖项只影响本次调用，不会写回句柄配置。
    pub async fn lock_with<K: AsRef<str>>(&self, keys: &[K], overrides: &LockOptions) -> Result<()> {
        let config = self.config.merge(overrides)?;
        self.acquire(dedup(keys), &config).await
    }

    /// 按模板展开后锁定，例如 `lock_pattern("item:{}:lock", &["a", "b"])`
    pub async fn lock_pattern<V: Display>(&self, template: &str, values: &[V]) -> Result<()> {
        let keys = KeyPattern::parse(template)?.expand(values);
        self.acquire(keys, &self.config).await
    }

    pub async fn lock_pattern_with<V: Display>(
        &self,
        template: &str,
        values: &[V],
        overrides: &LockOptions,
    ) -> Result<()> {
        let keys = KeyPattern::parse(template)?.expand(values);
        let config = self.config.merge(overrides)?;
        self.acquire(keys, &config).await
    }

    /// 获取循环
    ///
    /// 每轮提交一个批次；被创建的键加入持有集合并移出待锁定集合。
    /// 待锁定集合为空即成功；否则在未达上限时等待 `try_delay` 后只重试剩余键。
    /// 失败时不回滚已获得的键。
    #[instrument(
        skip(self, keys, config),
        fields(instance_id = %self.instance_id, key_count = keys.len(), try_limit = config.try_limit())
    )]
    async fn acquire(&self, keys: Vec<String>, config: &LockConfig) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let started = Instant::now();
        let mut pending = keys;
        let mut attempt: u32 = 1;

        loop {
            let namespaced: Vec<String> = pending.iter().map(|k| self.namespaced(k)).collect();
            metrics::record_lock_attempt(namespaced.len());

            let outcomes = self.store.set_nx_batch(&namespaced, config.ttl()).await?;

            let mut remaining = Vec::with_capacity(pending.len());
            let mut acquired: u64 = 0;
            {
                let mut held = self.held.lock();
                // 缺失的结果视为未获得
                for (index, (key, namespaced_key)) in
                    pending.into_iter().zip(namespaced).enumerate()
                {
                    if outcomes.get(index).is_some_and(SetOutcome::is_acquired) {
                        held.insert(namespaced_key);
                        acquired += 1;
                    } else {
                        remaining.push(key);
                    }
                }
            }
            metrics::record_keys_acquired(acquired);
            pending = remaining;

            if pending.is_empty() {
                metrics::record_acquire_duration(started.elapsed().as_secs_f64());
                debug!(attempt, "All keys locked");
                return Ok(());
            }

            if attempt < config.try_limit() {
                debug!(
                    attempt,
                    remaining = pending.len(),
                    retry_delay_ms = config.try_delay().as_millis() as u64,
                    "Keys still locked, retrying"
                );
                attempt += 1;
                tokio::time::sleep(config.try_delay()).await;
                continue;
            }

            metrics::record_lock_timeout();
            warn!(
                attempts = attempt,
                remaining = pending.len(),
                first_key = %pending[0],
                "Lock acquisition timed out"
            );

            if let Some(hook) = config.error_hook() {
                hook();
            }

            return Err(LockError::AcquisitionTimeout {
                key: pending.swap_remove(0),
                attempts: attempt,
            });
        }
    }

    /// 释放本句柄累积持有的全部键
    ///
    /// 一次批量删除；持有集合为空时不访问存储。删除按名称进行，不校验持有者。
    /// 删除成功后从集合中移除这些键，失败时保留以便重试。
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn release(&self) -> Result<()> {
        let keys = self.held_keys();
        if keys.is_empty() {
            debug!("Nothing to release");
            return Ok(());
        }

        let removed = self.store.delete(&keys).await?;

        {
            let mut held = self.held.lock();
            for key in &keys {
                held.remove(key);
            }
        }

        metrics::record_release(keys.len(), removed);
        if removed < keys.len() as u64 {
            // 部分键已过期或被他人删除
            warn!(
                requested = keys.len(),
                removed,
                "Some locks were already gone at release"
            );
        } else {
            info!(removed, "Locks released");
        }

        Ok(())
    }
}

/// 去重并保持原有顺序
fn dedup<K: AsRef<str>>(keys: &[K]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter()
        .map(|key| key.as_ref().to_string())
        .filter(|key| seen.insert(key.clone()))
        .collect()
}
