//! 翻译结果缓存
//!
//! Cache-aside storage for upstream responses. [`CacheStore`] is the only
//! type the request pipeline talks to; it wraps a [`CacheBackend`] and turns
//! every backend failure into a miss (for reads) or `false` (for writes), so
//! a cache outage degrades latency but never breaks a translation.

pub mod key;
pub mod memory;
pub mod redis_cache;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::env::cache::BackendKind;

pub use key::{CacheKey, KEY_NAMESPACE};
pub use memory::MemoryBackend;
pub use redis_cache::RedisBackend;

/// 默认缓存有效期：一周
pub const DEFAULT_TTL_SECS: u64 = 604_800;

/// 缓存后端错误
///
/// Never leaves [`CacheStore`]; it only exists so backends can report what
/// went wrong before the store logs and discards it.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("缓存连接错误: {0}")]
    Connection(String),

    #[error("缓存命令错误: {0}")]
    Command(String),
}

/// 缓存后端
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl`. Overwrites silently.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// 容错缓存（fail-open）
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    default_ttl: Duration,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// 从缓存获取数据，任何错误都视为未命中
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), key, "cache read failed: {}", e);
                None
            }
        }
    }

    /// 写入缓存，返回是否成功
    ///
    /// `ttl` defaults to the store's default (one week unless configured).
    /// Sub-second TTLs are rounded up to one second.
    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl).max(Duration::from_secs(1));
        match self.backend.set(key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), key, "cache write failed: {}", e);
                false
            }
        }
    }
}

/// Build the cache store described by the environment.
///
/// Returns `None` when caching is disabled or when the Redis backend cannot
/// be reached at start-up; the server then runs without a cache.
pub async fn store_from_config(
    enabled: bool,
    backend: BackendKind,
    redis_url: &str,
    ttl: Duration,
) -> Option<CacheStore> {
    if !enabled {
        tracing::info!("cache disabled");
        return None;
    }

    let backend: Arc<dyn CacheBackend> = match backend {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::Redis => match RedisBackend::connect(redis_url).await {
            Ok(redis) => {
                tracing::info!("Redis 缓存连接成功");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Redis 连接失败: {}; continuing without cache", e);
                return None;
            }
        },
    };

    Some(CacheStore::new(backend).with_default_ttl(ttl))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Backend that fails every call and records the TTLs it was asked for.
    #[derive(Default)]
    struct BrokenBackend {
        ttls: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Connection("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str, ttl: Duration) -> Result<(), CacheError> {
            self.ttls.lock().unwrap().push(ttl);
            Err(CacheError::Command("READONLY".to_string()))
        }
    }

    #[tokio::test]
    async fn test_backend_errors_become_miss_and_false() {
        let store = CacheStore::new(Arc::new(BrokenBackend::default()));

        assert_eq!(store.get("translate:abc").await, None);
        assert!(!store.set("translate:abc", "{}", None).await);
    }

    #[tokio::test]
    async fn test_set_uses_default_ttl_of_one_week() {
        let backend = Arc::new(BrokenBackend::default());
        let store = CacheStore::new(backend.clone());

        store.set("k", "v", None).await;
        store.set("k", "v", Some(Duration::from_secs(60))).await;
        store.set("k", "v", Some(Duration::ZERO)).await;

        let ttls = backend.ttls.lock().unwrap().clone();
        assert_eq!(
            ttls,
            vec![
                Duration::from_secs(604_800),
                Duration::from_secs(60),
                Duration::from_secs(1),
            ]
        );
    }

    #[tokio::test]
    async fn test_round_trip_through_memory_backend() {
        let store = CacheStore::new(Arc::new(MemoryBackend::new()));

        assert_eq!(store.get("translate:x").await, None);
        assert!(store.set("translate:x", r#"{"data":1}"#, None).await);
        assert_eq!(store.get("translate:x").await.as_deref(), Some(r#"{"data":1}"#));
    }

    #[tokio::test]
    async fn test_disabled_config_builds_no_store() {
        let store = store_from_config(false, BackendKind::Memory, "redis://localhost", Duration::from_secs(5)).await;
        assert!(store.is_none());

        let store = store_from_config(true, BackendKind::Memory, "redis://localhost", Duration::from_secs(5))
            .await
            .expect("memory backend always builds");
        assert_eq!(store.backend_name(), "memory");
        assert_eq!(store.default_ttl(), Duration::from_secs(5));
    }
}
