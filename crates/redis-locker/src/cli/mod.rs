//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `lock` - 锁定一个或多个键，保持一段时间后释放
//! - `pattern` - 按模板展开后锁定
//! - `ping` - 检查 Redis 连通性
//!
//! # 使用示例
//!
//! ```bash
//! # 锁定两个键，保持 5 秒
//! redis-locker lock order:1 order:2 --ttl-ms 30000 --hold-ms 5000
//!
//! # 按模板锁定
//! redis-locker pattern "item:{}:lock" a b a --try-limit 3
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands, LockArgs, SERVICE_NAME};
pub use runner::{CommandRunner, LockReport};
