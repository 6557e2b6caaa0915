//! 进程内缓存后端

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CacheBackend, CacheError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// 过期清理的默认间隔
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// 基于 DashMap 的过期键值存储
///
/// An expired entry is dropped when its key is read. Writes also sweep the
/// whole map, at most once per sweep interval, so keys that are never read
/// again do not pile up.
#[derive(Debug)]
pub struct MemoryBackend {
    entries: DashMap<String, Entry>,
    sweep_interval: Duration,
    last_sweep: Mutex<Instant>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            last_sweep: Mutex::new(Instant::now()),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清理过期项，返回删除的数量
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "expired cache entries swept");
        }
        removed
    }

    fn sweep_if_due(&self) {
        // a concurrent writer already sweeping is enough
        let Ok(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        if last_sweep.elapsed() < self.sweep_interval {
            return;
        }
        *last_sweep = Instant::now();
        drop(last_sweep);

        self.cleanup_expired();
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        } else {
            return Ok(None);
        }

        // 过期，删除缓存
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Command(format!("ttl out of range: {:?}", ttl)))?;

        self.sweep_if_due();
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}
