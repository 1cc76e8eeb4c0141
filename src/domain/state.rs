// ==========================================
// IBP 鲁棒评估引擎 - 状态快照
// ==========================================
// 职责: export_state / import_state 的载体
// 说明: 导入时各部分均可缺省，仅覆盖提供的部分
// ==========================================

use crate::config::PlanningConfig;
use crate::domain::decision::DecisionVector;
use crate::domain::objective::RobustObjectiveSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandState {
    pub forecast: Vec<f64>,
    pub uncertainty: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyState {
    pub capacity: Vec<f64>,
    pub unit_cost: Vec<f64>,
    pub lead_times: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryState {
    pub levels: Vec<f64>,
    pub targets: Vec<f64>,
    pub safety_stock: Vec<f64>,
    #[serde(default)]
    pub holding_cost: Option<Vec<f64>>,
}

/// 模型状态快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub config: PlanningConfig,
    #[serde(default)]
    pub demand: Option<DemandState>,
    #[serde(default)]
    pub supply: Option<SupplyState>,
    #[serde(default)]
    pub inventory: Option<InventoryState>,
    #[serde(default)]
    pub decisions: Option<DecisionVector>,
    #[serde(default)]
    pub objectives: Option<RobustObjectiveSet>,
}
