// ==========================================
// 缓存管理器集成测试
// ==========================================
// 职责: 验证 TTL 过期、容量淘汰、命中统计与键生成
// ==========================================

use ibp_optimization::cache::{create_key, CacheManager, KEY_DELIMITER};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_ttl_expiry_counts_as_miss() {
    let cache: CacheManager<String> = CacheManager::new(10, Duration::from_millis(20));
    cache.set("short", "a".to_string());
    cache.set_with_ttl("long", "b".to_string(), Some(Duration::from_secs(60)));

    thread::sleep(Duration::from_millis(50));

    assert_eq!(cache.get("short"), None);
    assert_eq!(cache.get("long"), Some("b".to_string()));
    // 过期条目读取时删除
    assert_eq!(cache.len(), 1);

    let stats = cache.stats();
    println!("缓存统计: {:?}", stats);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hit_rate, 50.0);
}

#[test]
fn test_capacity_evicts_earliest_insertion() {
    let cache: CacheManager<u32> = CacheManager::new(3, Duration::from_secs(60));
    for (i, key) in ["a", "b", "c"].iter().enumerate() {
        cache.set(*key, i as u32);
    }
    // 读取不影响淘汰顺序
    assert_eq!(cache.get("a"), Some(0));

    cache.set("d", 3);
    assert_eq!(cache.len(), 3);
    assert!(!cache.has("a"));
    assert!(cache.has("b"));
    assert!(cache.has("d"));

    // 覆盖已有键不触发淘汰
    cache.set("b", 10);
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get("c"), Some(2));
}

#[test]
fn test_zero_capacity_disables_cache() {
    let cache: CacheManager<u32> = CacheManager::new(0, Duration::from_secs(60));
    cache.set("a", 1);
    assert!(cache.is_empty());
    assert_eq!(cache.get("a"), None);
}

#[test]
fn test_clear_resets_counters() {
    let cache: CacheManager<u32> = CacheManager::new(5, Duration::from_secs(60));
    cache.set("a", 1);
    cache.get("a");
    cache.get("missing");
    assert!(cache.stats().memory_usage_kb <= 1);

    cache.clear();
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (0, 0, 0));
    assert_eq!(stats.hit_rate, 0.0);
}

#[test]
fn test_concurrent_access() {
    let cache: Arc<CacheManager<usize>> = Arc::new(CacheManager::new(1000, Duration::from_secs(60)));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    let key = format!("{}-{}", t, i);
                    cache.set(key.clone(), i);
                    assert_eq!(cache.get(&key), Some(i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 400);
    assert_eq!(cache.stats().hits, 400);
}

#[test]
fn test_create_key_formats() {
    let key = create_key(&[json!("scenarios"), json!(500), json!(18), json!([1.5, 2.0]), json!(null)]);
    assert_eq!(key, format!("scenarios{d}500{d}18{d}[1.5,2.0]{d}null", d = KEY_DELIMITER));

    let nested = create_key(&[json!({"a": 1}), json!(true)]);
    assert_eq!(nested, format!("{{\"a\":1}}{}true", KEY_DELIMITER));
}
