// ==========================================
// IBP 鲁棒评估引擎 - 结果缓存
// ==========================================
// 职责: 带 TTL 与容量上限的结果记忆化
// 红线: size <= max_size 恒成立; 缓存层从不报错，异常一律按未命中处理
// ==========================================
// 策略:
// - set: 满且 key 为新时，淘汰最早写入的一项 (O(size) 扫描)
// - get: 不存在 → miss; 存活时间 > ttl → 删除并 miss; 否则 hit
// - key: 参数字符串化后以 "|" 连接，结构化参数先 JSON 编码
// ==========================================

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// 键分隔符
pub const KEY_DELIMITER: &str = "|";

// 每个条目的结构开销估算（字节）
const ENTRY_OVERHEAD_BYTES: usize = 32;
// 值无法序列化时的估算（字节）
const UNKNOWN_VALUE_BYTES: usize = 1024;

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
    // 写入序号，淘汰时取最小
    seq: u64,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    next_seq: u64,
}

/// 缓存统计
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// 命中率（百分比）
    pub hit_rate: f64,
    pub size: usize,
    pub max_size: usize,
    /// 估算内存占用（KB）
    pub memory_usage_kb: usize,
    pub ttl_ms: u64,
}

// ==========================================
// CacheManager - TTL 缓存
// ==========================================
pub struct CacheManager<V> {
    inner: Mutex<CacheInner<V>>,
    max_size: usize,
    ttl: Duration,
}

impl<V: Clone + Serialize> CacheManager<V> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                next_seq: 0,
            }),
            max_size,
            ttl,
        }
    }

    /// 写入（使用默认 TTL）
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, None);
    }

    /// 写入，可指定单条 TTL
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        if self.max_size == 0 {
            return;
        }
        let key = key.into();
        let mut inner = self.lock();

        if inner.entries.len() >= self.max_size && !inner.entries.contains_key(&key) {
            Self::evict_oldest(&mut inner);
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
                ttl: ttl.unwrap_or(self.ttl),
                seq,
            },
        );
    }

    /// 读取；过期条目在此处删除
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();

        let expired = match inner.entries.get(key) {
            None => {
                inner.misses += 1;
                debug!(key = %abbreviate(key), "缓存未命中");
                return None;
            }
            Some(entry) => entry.created_at.elapsed() > entry.ttl,
        };

        if expired {
            inner.entries.remove(key);
            inner.misses += 1;
            debug!(key = %abbreviate(key), "缓存条目已过期");
            return None;
        }

        inner.hits += 1;
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn delete(&self, key: &str) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    /// 清空条目并重置计数
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total = inner.hits + inner.misses;
        let hit_rate = if total > 0 {
            inner.hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
            size: inner.entries.len(),
            max_size: self.max_size,
            memory_usage_kb: Self::estimate_memory_kb(&inner),
            ttl_ms: self.ttl.as_millis() as u64,
        }
    }

    fn evict_oldest(inner: &mut CacheInner<V>) {
        let oldest = inner
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.seq)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            inner.entries.remove(&key);
            debug!(key = %abbreviate(&key), "缓存已满，淘汰最早条目");
        }
    }

    /// 粗略估算: 键/值按 UTF-16 计 2 字节每字符，外加每条目结构开销
    fn estimate_memory_kb(inner: &CacheInner<V>) -> usize {
        let mut bytes = 0usize;
        for (key, entry) in &inner.entries {
            bytes += key.len() * 2;
            bytes += match serde_json::to_string(&entry.value) {
                Ok(json) => json.len() * 2,
                Err(_) => UNKNOWN_VALUE_BYTES,
            };
        }
        bytes += inner.entries.len() * 2 * ENTRY_OVERHEAD_BYTES;
        (bytes as f64 / 1024.0).round() as usize
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner<V>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 生成缓存键
///
/// 字符串原样使用，其余标量取其文本形式，数组/对象先 JSON 编码；
/// 结构化参数的字段顺序由调用方保证一致
pub fn create_key(args: &[Value]) -> String {
    args.iter()
        .map(|arg| match arg {
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(KEY_DELIMITER)
}

fn abbreviate(key: &str) -> &str {
    match key.char_indices().nth(64) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    #[test]
    fn test_set_then_get() {
        let cache: CacheManager<String> = CacheManager::new(10, Duration::from_secs(60));
        cache.set("k", "v".to_string());
        assert_eq!(cache.get("k"), Some("v".to_string()));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate, 100.0);
    }

    #[test]
    fn test_expired_entry_is_removed_and_counted_as_miss() {
        let cache: CacheManager<u32> = CacheManager::new(10, Duration::from_millis(20));
        cache.set("k", 1);
        sleep(Duration::from_millis(50));

        assert_eq!(cache.get("k"), None);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_custom_ttl_overrides_default() {
        let cache: CacheManager<u32> = CacheManager::new(10, Duration::from_millis(10));
        cache.set_with_ttl("long", 1, Some(Duration::from_secs(60)));
        cache.set("short", 2);
        sleep(Duration::from_millis(30));

        assert_eq!(cache.get("long"), Some(1));
        assert_eq!(cache.get("short"), None);
    }

    #[test]
    fn test_eviction_removes_earliest_surviving_entry() {
        let cache: CacheManager<u32> = CacheManager::new(3, Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.delete("a");
        cache.set("d", 4);
        // 未满，无淘汰
        assert_eq!(cache.len(), 3);

        cache.set("e", 5);
        assert_eq!(cache.len(), 3);
        assert!(!cache.has("b"));
        assert!(cache.has("c"));
        assert!(cache.has("d"));
        assert!(cache.has("e"));
    }

    #[test]
    fn test_overwrite_existing_key_does_not_evict() {
        let cache: CacheManager<u32> = CacheManager::new(2, Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));
        // a 被重写后成为最新条目，下一次淘汰 b
        cache.set("c", 3);
        assert!(cache.has("a"));
        assert!(!cache.has("b"));
    }

    #[test]
    fn test_create_key_encoding() {
        let key = create_key(&[json!("scenarios"), json!(500), json!(true), json!([1.5, 2.0]), json!({"a": 1})]);
        assert_eq!(key, "scenarios|500|true|[1.5,2.0]|{\"a\":1}");

        let again = create_key(&[json!("scenarios"), json!(500), json!(true), json!([1.5, 2.0]), json!({"a": 1})]);
        assert_eq!(key, again);
    }

    #[test]
    fn test_clear_resets_counters() {
        let cache: CacheManager<u32> = CacheManager::new(5, Duration::from_secs(60));
        cache.set("a", 1);
        cache.get("a");
        cache.get("missing");
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn test_memory_estimate_grows_with_entries() {
        let cache: CacheManager<Vec<f64>> = CacheManager::new(5, Duration::from_secs(60));
        assert_eq!(cache.stats().memory_usage_kb, 0);
        cache.set("big", vec![1234.5678; 2000]);
        assert!(cache.stats().memory_usage_kb > 10);
    }
}
