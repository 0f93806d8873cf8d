//! 锁配置
//!
//! `LockOptions` 是部分配置（构造参数或单次调用覆盖），`LockConfig` 是校验后的完整配置。
//! 合并是纯函数：覆盖项替换同名字段，未指定字段沿用基础配置，基础配置本身不会被修改。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LockError, Result};

/// 默认重试间隔（毫秒）
pub const DEFAULT_TRY_DELAY_MS: u64 = 25;
/// 默认最大尝试次数
pub const DEFAULT_TRY_LIMIT: u32 = 10;

/// 重试耗尽时的回调，在错误返回给调用方之前同步调用一次
pub type ErrorHook = Arc<dyn Fn() + Send + Sync>;

/// 部分锁配置
///
/// 每个字段为 `None` 表示"未指定"。`ttl` 与 `on_error` 是可空字段，
/// 因此用两层 `Option` 区分"未指定"和"显式设为空"。
#[derive(Clone, Default)]
pub struct LockOptions {
    ttl_ms: Option<Option<u64>>,
    try_delay_ms: Option<u64>,
    try_limit: Option<u32>,
    on_error: Option<Option<ErrorHook>>,
}

impl LockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 锁在服务端的过期时间（毫秒）
    pub fn ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = Some(Some(ttl_ms));
        self
    }

    /// 锁永不过期
    pub fn no_expiry(mut self) -> Self {
        self.ttl_ms = Some(None);
        self
    }

    /// 两次尝试之间的等待时间（毫秒）
    pub fn try_delay_ms(mut self, try_delay_ms: u64) -> Self {
        self.try_delay_ms = Some(try_delay_ms);
        self
    }

    /// 最大尝试次数（含首次）
    pub fn try_limit(mut self, try_limit: u32) -> Self {
        self.try_limit = Some(try_limit);
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_error = Some(Some(Arc::new(hook)));
        self
    }

    /// 显式清除错误回调
    pub fn without_error_hook(mut self) -> Self {
        self.on_error = Some(None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ttl_ms.is_none()
            && self.try_delay_ms.is_none()
            && self.try_limit.is_none()
            && self.on_error.is_none()
    }
}

impl fmt::Debug for LockOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockOptions")
            .field("ttl_ms", &self.ttl_ms)
            .field("try_delay_ms", &self.try_delay_ms)
            .field("try_limit", &self.try_limit)
            .field("on_error", &self.on_error.as_ref().map(|hook| hook.is_some()))
            .finish()
    }
}

impl From<&locker_shared::config::LockerSettings> for LockOptions {
    fn from(settings: &locker_shared::config::LockerSettings) -> Self {
        let options = Self::new()
            .try_delay_ms(settings.try_delay_ms)
            .try_limit(settings.try_limit);
        match settings.ttl_ms {
            Some(ttl_ms) => options.ttl_ms(ttl_ms),
            None => options.no_expiry(),
        }
    }
}

/// 校验后的锁配置
///
/// 只能通过 [`LockConfig::from_options`] 或 [`LockConfig::merge`] 得到，
/// 因此所有数值字段都保证为正数。
#[derive(Clone)]
pub struct LockConfig {
    ttl: Option<Duration>,
    try_delay: Duration,
    try_limit: u32,
    on_error: Option<ErrorHook>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: None,
            try_delay: Duration::from_millis(DEFAULT_TRY_DELAY_MS),
            try_limit: DEFAULT_TRY_LIMIT,
            on_error: None,
        }
    }
}

impl fmt::Debug for LockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockConfig")
            .field("ttl", &self.ttl)
            .field("try_delay", &self.try_delay)
            .field("try_limit", &self.try_limit)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl LockConfig {
    /// 以默认配置为基础合并 `options`
    pub fn from_options(options: &LockOptions) -> Result<Self> {
        Self::default().merge(options)
    }

    /// 合并覆盖项，返回新的配置
    pub fn merge(&self, overrides: &LockOptions) -> Result<Self> {
        let ttl = match overrides.ttl_ms {
            Some(Some(ms)) => Some(Duration::from_millis(positive_u64("ttl", ms)?)),
            Some(None) => None,
            None => self.ttl,
        };

        let try_delay = match overrides.try_delay_ms {
            Some(ms) => Duration::from_millis(positive_u64("try_delay", ms)?),
            None => self.try_delay,
        };

        let try_limit = match overrides.try_limit {
            Some(0) => return Err(LockError::invalid_config("try_limit", "must be positive")),
            Some(limit) => limit,
            None => self.try_limit,
        };

        let on_error = match &overrides.on_error {
            Some(hook) => hook.clone(),
            None => self.on_error.clone(),
        };

        Ok(Self {
            ttl,
            try_delay,
            try_limit,
            on_error,
        })
    }

    /// 锁的过期时间，`None` 表示永不过期
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn try_delay(&self) -> Duration {
        self.try_delay
    }

    pub fn try_limit(&self) -> u32 {
        self.try_limit
    }

    pub fn has_error_hook(&self) -> bool {
        self.on_error.is_some()
    }

    pub(crate) fn error_hook(&self) -> Option<&ErrorHook> {
        self.on_error.as_ref()
    }
}

fn positive_u64(field: &'static str, value: u64) -> Result<u64> {
    if value == 0 {
        return Err(LockError::invalid_config(field, "must be positive"));
    }
    Ok(value)
}
