//! Redis 分布式锁
//!
//! 基于单个 Redis 实例的 `SET NX [PX]` 实现多键互斥锁。
//!
//! ## 核心功能
//!
//! - **多键锁定**：一次调用锁定多个键，每轮批量提交，只重试仍被占用的键
//! - **模式锁定**：`item:{}:lock` 形式的模板加替换值，展开后去重锁定
//! - **单次覆盖配置**：每次调用可临时覆盖 ttl / 重试间隔 / 重试次数 / 错误回调
//! - **累积释放**：句柄记录所有获得的键，`release()` 一次批量删除
//!
//! ## 模块结构
//!
//! - `options`: 配置校验与合并
//! - `pattern`: 键模式展开
//! - `store`: 存储抽象与 Redis 实现
//! - `lock`: 锁管理器
//! - `error`: 错误类型定义
//! - `cli`: 命令行入口
//! - `test_utils`: 内存存储，供测试使用

pub mod cli;
pub mod error;
pub mod lock;
pub mod options;
pub mod pattern;
pub mod store;
pub mod test_utils;

pub use error::{LockError, Result};
pub use lock::{DEFAULT_KEY_PREFIX, Locker, RedisLocker};
pub use options::{ErrorHook, LockConfig, LockOptions};
pub use pattern::KeyPattern;
pub use store::{LockStore, RedisLockStore, SetOutcome};
