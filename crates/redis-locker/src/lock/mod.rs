//! 分布式锁模块
//!
//! 基于单个存储的 set-if-absent 原子操作实现多键互斥。
//!
//! ## 设计要点
//!
//! - **批量尝试**: 每一轮把所有待锁定键放进一个事务提交
//! - **只重试剩余键**: 已获得的键不会被重新尝试
//! - **累积持有**: 句柄记录所有成功获得的键，`release()` 一次性删除
//! - **不自动回滚**: 超时失败时已获得的键仍由句柄持有，需要显式释放
//!
//! ## 使用示例
//!
//! ```ignore
//! let store = Arc::new(RedisLockStore::new(&config.redis)?);
//! let locker = Locker::new(store, &LockOptions::new().ttl_ms(30_000))?;
//!
//! locker.lock(&["order:1", "order:2"]).await?;
//! locker.lock_pattern("item:{}:lock", &["a", "b"]).await?;
//!
//! do_critical_work().await?;
//!
//! locker.release().await?;
//! ```

mod lock_manager;

pub use lock_manager::{DEFAULT_KEY_PREFIX, Locker, RedisLocker};
