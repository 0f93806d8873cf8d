//! Redis 锁存储
//!
//! 每次尝试使用一个 MULTI/EXEC 事务批量发送 `SET key "" NX [PX ttl]`，
//! 释放时一次 `DEL k1 k2 ...`。

use async_trait::async_trait;
use locker_shared::config::RedisConfig;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{LockStore, SetOutcome};
use crate::error::{LockError, Result};

/// Redis 锁存储
#[derive(Clone)]
pub struct RedisLockStore {
    client: Client,
}

impl RedisLockStore {
    /// 创建 Redis 客户端（不会立即建立连接）
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        info!("Redis client created");
        Ok(Self { client })
    }

    async fn get_conn(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(LockError::from)
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get_conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(LockError::from)
    }
}

/// 解析单条 SET NX 的返回值
///
/// 成功时返回 `OK`，键已存在时返回 nil；单条命令的服务端错误只影响该键。
fn parse_set_reply(reply: Value) -> SetOutcome {
    match reply {
        Value::Okay => SetOutcome::Acquired,
        Value::SimpleString(ref s) if s == "OK" => SetOutcome::Acquired,
        Value::Nil => SetOutcome::Held,
        Value::ServerError(err) => SetOutcome::Failed(err.to_string()),
        other => SetOutcome::Failed(format!("{other:?}")),
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    #[instrument(skip(self, keys), fields(key_count = keys.len()))]
    async fn set_nx_batch(
        &self,
        keys: &[String],
        ttl: Option<Duration>,
    ) -> Result<Vec<SetOutcome>> {
        let mut conn = self.get_conn().await?;

        // 保留 EXEC 结果中的逐条错误，避免整批失败丢失已创建的键
        let mut pipe = redis::pipe();
        pipe.atomic().ignore_errors();
        for key in keys {
            // SET key "" NX [PX milliseconds]
            pipe.cmd("SET").arg(key).arg("").arg("NX");
            if let Some(ttl) = ttl {
                pipe.arg("PX").arg(ttl.as_millis() as u64);
            }
        }

        let replies: Vec<Value> = pipe.query_async(&mut conn).await?;
        debug!(replies = replies.len(), "SET NX batch executed");

        Ok(replies.into_iter().map(parse_set_reply).collect())
    }

    #[instrument(skip(self, keys), fields(key_count = keys.len()))]
    async fn delete(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.get_conn().await?;
        let removed: u64 = conn.del(keys).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_reply() {
        assert_eq!(parse_set_reply(Value::Okay), SetOutcome::Acquired);
        assert_eq!(
            parse_set_reply(Value::SimpleString("OK".to_string())),
            SetOutcome::Acquired
        );
        assert_eq!(parse_set_reply(Value::Nil), SetOutcome::Held);
        assert!(matches!(parse_set_reply(Value::Int(1)), SetOutcome::Failed(_)));
    }

    #[test]
    fn test_parse_set_reply_server_error_fails_single_key() {
        let reply = redis::parse_redis_value(
            b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n",
        )
        .unwrap();
        assert!(matches!(reply, Value::ServerError(_)));

        match parse_set_reply(reply) {
            SetOutcome::Failed(message) => assert!(message.contains("WRONGTYPE")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = RedisConfig {
            url: "not-a-redis-url".to_string(),
        };
        assert!(matches!(RedisLockStore::new(&config), Err(LockError::Redis(_))));
    }
}
