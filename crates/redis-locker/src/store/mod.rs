//! 锁存储抽象
//!
//! 锁管理器只依赖"批量 set-if-absent"与"批量删除"两个能力，
//! 便于服务层依赖抽象而非具体实现，支持 mock 测试。

mod redis_store;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

pub use redis_store::RedisLockStore;

/// 单个键的 set-if-absent 结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// 键被创建，调用方成为持有者
    Acquired,
    /// 键已存在
    Held,
    /// 该键的命令执行失败
    Failed(String),
}

impl SetOutcome {
    pub fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired)
    }
}

/// 锁存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LockStore: Send + Sync {
    /// 在一次往返中对每个键执行"不存在才创建（空值）"，`ttl` 存在时同时设置毫秒级过期。
    ///
    /// 返回值与 `keys` 一一对应、顺序一致；各键之间不保证原子性。
    async fn set_nx_batch(&self, keys: &[String], ttl: Option<Duration>)
        -> Result<Vec<SetOutcome>>;

    /// 按名称批量删除，返回实际删除的数量
    async fn delete(&self, keys: &[String]) -> Result<u64>;
}
