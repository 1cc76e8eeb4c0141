// ==========================================
// IBP 鲁棒评估引擎 - 缓存层
// ==========================================

pub mod cache_manager;

pub use cache_manager::{create_key, CacheManager, CacheStats, KEY_DELIMITER};

use crate::domain::{RobustObjectiveSet, ScenarioBundle};
use serde::Serialize;

/// 门面缓存的值类型
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CachedValue {
    Scenarios(ScenarioBundle),
    Objectives(RobustObjectiveSet),
}
