// ==========================================
// IBP 鲁棒评估引擎 - 鲁棒目标
// ==========================================
// 职责: 单目标的情景分布汇总 + 目标集合
// 红线: raw_scenarios.len() == N
// ==========================================

use crate::domain::types::ObjectiveKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 每个目标在全部情景下的原始结果
pub type ObjectiveRawSet = BTreeMap<ObjectiveKind, Vec<f64>>;

/// 单目标鲁棒统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobustObjective {
    pub mean: f64,
    /// 总体标准差 (除以 N)
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub q25: f64,
    pub q75: f64,
    pub cvar90: f64,
    pub cvar95: f64,
    /// 原始情景结果（按情景顺序，未排序）
    pub raw_scenarios: Vec<f64>,
}

/// 鲁棒目标集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RobustObjectiveSet {
    objectives: BTreeMap<ObjectiveKind, RobustObjective>,
}

impl RobustObjectiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ObjectiveKind, objective: RobustObjective) {
        self.objectives.insert(kind, objective);
    }

    pub fn get(&self, kind: ObjectiveKind) -> Option<&RobustObjective> {
        self.objectives.get(&kind)
    }

    pub fn cost(&self) -> Option<&RobustObjective> {
        self.get(ObjectiveKind::Cost)
    }

    pub fn service_level(&self) -> Option<&RobustObjective> {
        self.get(ObjectiveKind::ServiceLevel)
    }

    pub fn inventory_turns(&self) -> Option<&RobustObjective> {
        self.get(ObjectiveKind::InventoryTurns)
    }

    pub fn sustainability(&self) -> Option<&RobustObjective> {
        self.get(ObjectiveKind::Sustainability)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ObjectiveKind> + '_ {
        self.objectives.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectiveKind, &RobustObjective)> {
        self.objectives.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }

    /// 各目标均值（供搜索算法直接读取）
    pub fn means(&self) -> BTreeMap<ObjectiveKind, f64> {
        self.iter().map(|(k, v)| (k, v.mean)).collect()
    }
}
