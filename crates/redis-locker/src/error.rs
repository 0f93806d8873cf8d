//! 锁服务错误类型
//!
//! 区分配置错误、模式错误、锁竞争超时与存储层错误。

use thiserror::Error;

/// 锁服务错误类型
#[derive(Debug, Error)]
pub enum LockError {
    // === 输入校验错误（不会触达存储） ===
    #[error("无效的锁配置: {field} - {message}")]
    InvalidConfiguration {
        field: &'static str,
        message: String,
    },

    #[error("无效的键模式: {0}")]
    InvalidPattern(String),

    // === 锁竞争 ===
    /// 重试次数耗尽后仍有键被占用，`key` 为剩余待锁定键中的第一个
    #[error("无法锁定键 \"{key}\": 已尝试 {attempts} 次")]
    AcquisitionTimeout { key: String, attempts: u32 },

    // === 存储错误 ===
    #[error("Redis 错误: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("存储错误: {0}")]
    Store(String),
}

/// 锁服务 Result 类型别名
pub type Result<T> = std::result::Result<T, LockError>;

impl LockError {
    pub(crate) fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            message: message.into(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            Self::InvalidPattern(_) => "INVALID_PATTERN",
            Self::AcquisitionTimeout { .. } => "LOCKED",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// 是否为可重试的错误
    ///
    /// 只有传输层错误可重试；锁内部不会自动重试它们，由调用方决定。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Redis(_) | Self::Store(_))
    }

    /// 是否为锁竞争超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::AcquisitionTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = LockError::AcquisitionTimeout {
            key: "order:1".to_string(),
            attempts: 10,
        };
        assert_eq!(err.code(), "LOCKED");
        assert!(err.is_timeout());
        assert!(!err.is_retryable());

        assert_eq!(
            LockError::invalid_config("try_limit", "must be positive").code(),
            "INVALID_CONFIGURATION"
        );
        assert_eq!(LockError::InvalidPattern("x".into()).code(), "INVALID_PATTERN");
    }

    #[test]
    fn test_is_retryable() {
        assert!(LockError::Store("connection reset".into()).is_retryable());
        assert!(!LockError::InvalidPattern("x".into()).is_retryable());
    }

    #[test]
    fn test_timeout_message_names_key() {
        let err = LockError::AcquisitionTimeout {
            key: "order:1".to_string(),
            attempts: 3,
        };
        let message = err.to_string();
        assert!(message.contains("order:1"));
        assert!(message.contains('3'));
    }
}
