use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use tokio::time::Instant;

use crate::cache::models::CacheEntry;

const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// 固定容量的 LRU 响应缓存，每个条目单独设置过期时间
///
/// 过期在读取时惰性检查，不做后台清理。容量满时淘汰最久未使用的条目，
/// 与剩余过期时间无关。
pub struct ResponseCache<V> {
    entries: LruCache<String, CacheEntry<V>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        tracing::debug!("Creating response cache with capacity {}", capacity);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// 读取未过期的条目，命中时刷新其最近使用顺序
    pub fn get(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.is_live(Instant::now()) {
            return Some(entry.value.clone());
        }

        tracing::trace!("Cache entry expired: {}", key);
        self.entries.pop(key);
        None
    }

    /// 写入条目；超出容量时先淘汰最久未使用的条目
    pub fn set(&mut self, key: String, value: V, ttl: Duration) {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            // 超大 TTL 按永不过期处理
            expires_at: now.checked_add(ttl).unwrap_or(now + MAX_TTL),
        };
        if let Some((evicted, _)) = self.entries.push(key.clone(), entry) {
            if evicted != key {
                tracing::trace!("Evicted least recently used entry: {}", evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}
