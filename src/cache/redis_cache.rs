//! Redis 缓存后端
//!
//! One [`ConnectionManager`] is shared by every in-flight request: it
//! multiplexes commands over a single connection and reconnects on its own
//! after the server goes away.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};

use super::{CacheBackend, CacheError};

/// Redis 缓存客户端
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// 连接 Redis 并测试连接
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(|e| CacheError::Connection(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let backend = Self { conn };
        backend.ping().await?;
        Ok(backend)
    }

    /// 测试 Redis 连接
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

impl From<RedisError> for CacheError {
    fn from(error: RedisError) -> Self {
        if error.is_connection_dropped() || error.is_connection_refusal() || error.is_timeout() {
            CacheError::Connection(error.to_string())
        } else {
            CacheError::Command(error.to_string())
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(cached)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
