//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 未安装 recorder 时，记录函数为空操作。

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

use super::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    pub addr: SocketAddr,
}

/// 初始化 Prometheus 指标导出
///
/// 在指定端口暴露 `/metrics` 端点，需要在 tokio runtime 内调用。
pub fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_lock_metrics();
    metrics::counter!("service_starts_total", "service" => config.service_name.clone())
        .increment(1);

    info!("Metrics exporter listening on {}", addr);
    Ok(MetricsHandle { addr })
}

/// 注册锁相关指标的描述
pub fn describe_lock_metrics() {
    metrics::describe_counter!(
        "locker_attempts_total",
        "Total number of batched lock attempts"
    );
    metrics::describe_counter!(
        "locker_keys_acquired_total",
        "Total number of keys acquired"
    );
    metrics::describe_counter!(
        "locker_timeouts_total",
        "Total number of lock acquisitions that ran out of attempts"
    );
    metrics::describe_counter!("locker_releases_total", "Total number of bulk releases");
    metrics::describe_histogram!(
        "locker_acquire_duration_seconds",
        "Time from first attempt to successful acquisition in seconds"
    );
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录一次批量尝试
#[inline]
pub fn record_lock_attempt(key_count: usize) {
    metrics::counter!("locker_attempts_total").increment(1);
    metrics::histogram!("locker_attempt_batch_size").record(key_count as f64);
}

/// 记录本轮获得的键数量
#[inline]
pub fn record_keys_acquired(count: u64) {
    metrics::counter!("locker_keys_acquired_total").increment(count);
}

/// 记录获取成功耗时
#[inline]
pub fn record_acquire_duration(duration_secs: f64) {
    metrics::histogram!("locker_acquire_duration_seconds").record(duration_secs);
}

/// 记录获取超时
#[inline]
pub fn record_lock_timeout() {
    metrics::counter!("locker_timeouts_total").increment(1);
}

/// 记录一次批量释放
#[inline]
pub fn record_release(requested: usize, removed: u64) {
    metrics::counter!("locker_releases_total").increment(1);
    metrics::counter!("locker_released_keys_total").increment(removed);
    if removed < requested as u64 {
        metrics::counter!("locker_release_missing_keys_total")
            .increment(requested as u64 - removed);
    }
}
