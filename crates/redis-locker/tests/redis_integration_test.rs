//! Redis 集成测试
//!
//! 使用真实 Redis 验证 MULTI/EXEC 批量 SET NX PX 与批量 DEL 的行为。
//!
//! ## 运行方式
//!
//! ```bash
//! REDIS_URL=redis://localhost:6379/1 \
//!   cargo test --test redis_integration_test -- --ignored
//! ```

use locker_shared::test_utils::{fast_locker_settings, test_key_prefix, test_redis_config};
use redis::AsyncCommands;
use redis_locker::{LockError, LockOptions, LockStore, Locker, RedisLockStore, SetOutcome};
use std::sync::Arc;
use std::time::Duration;

// ==================== 辅助函数 ====================

fn redis_store() -> Arc<RedisLockStore> {
    Arc::new(RedisLockStore::new(&test_redis_config()).expect("Redis URL must be valid"))
}

fn redis_locker(store: Arc<RedisLockStore>, prefix: &str) -> Locker<RedisLockStore> {
    Locker::new(store, &LockOptions::from(&fast_locker_settings()))
        .expect("valid settings")
        .with_key_prefix(prefix)
}

async fn raw_connection() -> redis::aio::MultiplexedConnection {
    redis::Client::open(test_redis_config().url.as_str())
        .expect("Redis URL must be valid")
        .get_multiplexed_async_connection()
        .await
        .expect("Redis connection failed")
}

// ==================== 测试用例 ====================

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_health_check() {
    redis_store().health_check().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_set_nx_batch_outcomes() {
    let store = redis_store();
    let prefix = test_key_prefix();
    let keys = vec![format!("{prefix}a"), format!("{prefix}b")];

    let first = store.set_nx_batch(&keys, None).await.unwrap();
    assert_eq!(first, vec![SetOutcome::Acquired, SetOutcome::Acquired]);

    let second = store.set_nx_batch(&keys, None).await.unwrap();
    assert_eq!(second, vec![SetOutcome::Held, SetOutcome::Held]);

    assert_eq!(store.delete(&keys).await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_ttl_sets_millisecond_expiry() {
    let store = redis_store();
    let key = format!("{}ttl", test_key_prefix());

    store
        .set_nx_batch(std::slice::from_ref(&key), Some(Duration::from_millis(5_000)))
        .await
        .unwrap();

    let mut conn = raw_connection().await;
    let pttl: i64 = conn.pttl(&key).await.unwrap();
    assert!(pttl > 0 && pttl <= 5_000, "unexpected PTTL {pttl}");

    let value: String = conn.get(&key).await.unwrap();
    assert_eq!(value, "");

    store.delete(&[key]).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_lock_and_release_roundtrip() {
    let store = redis_store();
    let prefix = test_key_prefix();
    let locker = redis_locker(store.clone(), &prefix);

    locker.lock(&["order:1", "order:2"]).await.unwrap();
    locker.lock_pattern("item:{}", &["a", "a"]).await.unwrap();
    assert_eq!(locker.held_keys().len(), 3);

    let mut conn = raw_connection().await;
    let exists: bool = conn.exists(format!("{prefix}item:a")).await.unwrap();
    assert!(exists);

    locker.release().await.unwrap();
    let exists: bool = conn.exists(format!("{prefix}order:1")).await.unwrap();
    assert!(!exists);
    assert!(locker.held_keys().is_empty());
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_contention_between_handles() {
    let store = redis_store();
    let prefix = test_key_prefix();
    let owner = redis_locker(store.clone(), &prefix);
    let contender = redis_locker(store.clone(), &prefix);

    owner.lock(&["shared"]).await.unwrap();

    let err = contender.lock(&["free", "shared"]).await.unwrap_err();
    assert!(matches!(err, LockError::AcquisitionTimeout { ref key, attempts: 3 } if key == "shared"));
    assert!(contender.is_held("free"));

    owner.release().await.unwrap();
    contender.lock(&["shared"]).await.unwrap();
    contender.release().await.unwrap();
}
