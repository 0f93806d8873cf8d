//! 测试工具模块
//!
//! 提供进程内的 `LockStore` 实现，记录每一次批量尝试和删除，
//! 用于无外部依赖的单元测试和集成测试。

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::{LockError, Result};
use crate::store::{LockStore, SetOutcome};

/// 一次批量 set-if-absent 调用的记录
#[derive(Debug, Clone)]
pub struct RecordedBatch {
    pub keys: Vec<String>,
    pub ttl: Option<Duration>,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Entry {
    expires_at: Option<Instant>,
    /// 被尝试这么多次后自动释放，模拟其他持有者在重试期间释放锁
    release_after_attempts: Option<usize>,
    attempts: usize,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    batches: Vec<RecordedBatch>,
    deletes: Vec<Vec<String>>,
    fail_next: Option<String>,
}

/// 内存锁存储
///
/// 键名均为存储中的完整键（包含前缀）。
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    state: Mutex<State>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟其他持有者占用键（永不过期）
    pub fn occupy(&self, key: &str) {
        self.state.lock().entries.insert(key.to_string(), Entry::default());
    }

    /// 模拟其他持有者占用键，在被尝试 `attempts` 次后释放
    pub fn occupy_until_attempts(&self, key: &str, attempts: usize) {
        self.state.lock().entries.insert(
            key.to_string(),
            Entry {
                release_after_attempts: Some(attempts),
                ..Default::default()
            },
        );
    }

    /// 模拟其他持有者以 TTL 占用键
    pub fn occupy_for(&self, key: &str, ttl: Duration) {
        self.state.lock().entries.insert(
            key.to_string(),
            Entry {
                expires_at: Some(Instant::now() + ttl),
                ..Default::default()
            },
        );
    }

    /// 下一次批量尝试返回存储错误
    pub fn fail_next_batch(&self, message: &str) {
        self.state.lock().fail_next = Some(message.to_string());
    }

    /// 键当前是否存在（未过期）
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.state
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// 键的剩余过期时间，`None` 表示不存在或永不过期
    pub fn expiry_of(&self, key: &str) -> Option<Instant> {
        self.state.lock().entries.get(key).and_then(|e| e.expires_at)
    }

    pub fn batches(&self) -> Vec<RecordedBatch> {
        self.state.lock().batches.clone()
    }

    pub fn deletes(&self) -> Vec<Vec<String>> {
        self.state.lock().deletes.clone()
    }

    /// 某个键在所有批次中被尝试的次数
    pub fn attempts_for(&self, key: &str) -> usize {
        self.state
            .lock()
            .batches
            .iter()
            .filter(|batch| batch.keys.iter().any(|k| k == key))
            .count()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn set_nx_batch(
        &self,
        keys: &[String],
        ttl: Option<Duration>,
    ) -> Result<Vec<SetOutcome>> {
        let mut state = self.state.lock();
        let now = Instant::now();

        state.batches.push(RecordedBatch {
            keys: keys.to_vec(),
            ttl,
            at: now,
        });

        if let Some(message) = state.fail_next.take() {
            return Err(LockError::Store(message));
        }

        let outcomes = keys
            .iter()
            .map(|key| {
                let held = match state.entries.get_mut(key) {
                    Some(entry) if entry.is_live(now) => {
                        entry.attempts += 1;
                        entry
                            .release_after_attempts
                            .is_none_or(|limit| entry.attempts < limit)
                    }
                    _ => false,
                };

                if held {
                    SetOutcome::Held
                } else {
                    state.entries.insert(
                        key.clone(),
                        Entry {
                            expires_at: ttl.map(|ttl| now + ttl),
                            ..Default::default()
                        },
                    );
                    SetOutcome::Acquired
                }
            })
            .collect();

        Ok(outcomes)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        let mut state = self.state.lock();
        let now = Instant::now();
        state.deletes.push(keys.to_vec());

        let mut removed = 0;
        for key in keys {
            if let Some(entry) = state.entries.remove(key) {
                if entry.is_live(now) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}
