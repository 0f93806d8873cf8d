//! 测试工具模块
//!
//! 提供集成测试所需的配置辅助与唯一键生成。

use uuid::Uuid;

use crate::config::{LockerSettings, RedisConfig};

/// 创建测试用 Redis 配置
///
/// 优先使用环境变量，否则使用本地 Redis 的 1 号库
pub fn test_redis_config() -> RedisConfig {
    RedisConfig {
        url: std::env::var("TEST_REDIS_URL")
            .or_else(|_| std::env::var("REDIS_URL"))
            .unwrap_or_else(|_| "redis://localhost:6379/1".to_string()),
    }
}

/// 快速失败的锁参数，避免测试长时间等待
pub fn fast_locker_settings() -> LockerSettings {
    LockerSettings {
        ttl_ms: Some(5_000),
        try_delay_ms: 5,
        try_limit: 3,
        ..Default::default()
    }
}

/// 生成唯一的测试键前缀，隔离并行运行的测试
pub fn test_key_prefix() -> String {
    format!("locker-test:{}:", Uuid::new_v4().simple())
}

/// 生成唯一的测试键
pub fn test_key(name: &str) -> String {
    format!("{}-{}", name, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix_is_unique() {
        let a = test_key_prefix();
        let b = test_key_prefix();
        assert_ne!(a, b);
        assert!(a.starts_with("locker-test:"));
        assert!(a.ends_with(':'));
    }

    #[test]
    fn test_fast_settings() {
        let settings = fast_locker_settings();
        assert_eq!(settings.try_limit, 3);
        assert_eq!(settings.key_prefix, "locker:");
    }

    #[test]
    fn test_key_contains_name() {
        assert!(test_key("order").starts_with("order-"));
    }
}
