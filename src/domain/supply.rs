// ==========================================
// IBP 鲁棒评估引擎 - 供应与库存模型
// ==========================================
// 职责: 产能/提前期/单位成本; 库存水平/安全库存/目标/持有成本
// 说明: 仿真只使用 levels[0] 作为期初库存
// ==========================================

use serde::{Deserialize, Serialize};

/// 供应模型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyModel {
    /// 每期产能上限
    pub capacity: Vec<f64>,
    /// 每期提前期（月）
    pub lead_times: Vec<f64>,
    /// 每期单位成本
    pub unit_cost: Vec<f64>,
}

impl SupplyModel {
    pub fn zeros(horizon: usize) -> Self {
        Self {
            capacity: vec![0.0; horizon],
            lead_times: vec![0.0; horizon],
            unit_cost: vec![0.0; horizon],
        }
    }

    /// 返回第一个长度与规划期不一致的字段 (字段名, 实际长度)
    pub fn mismatched_field(&self, horizon: usize) -> Option<(&'static str, usize)> {
        [
            ("supply.capacity", self.capacity.len()),
            ("supply.leadTimes", self.lead_times.len()),
            ("supply.unitCost", self.unit_cost.len()),
        ]
        .into_iter()
        .find(|(_, len)| *len != horizon)
    }
}

/// 库存模型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryModel {
    /// 库存水平（仅 levels[0] 作为仿真期初库存）
    pub levels: Vec<f64>,
    /// 安全库存
    pub safety_stock: Vec<f64>,
    /// 目标库存
    pub targets: Vec<f64>,
    /// 单位持有成本
    pub holding_cost: Vec<f64>,
}

impl InventoryModel {
    pub fn zeros(horizon: usize) -> Self {
        Self {
            levels: vec![0.0; horizon],
            safety_stock: vec![0.0; horizon],
            targets: vec![0.0; horizon],
            holding_cost: vec![0.0; horizon],
        }
    }

    /// 仿真期初库存
    pub fn initial_level(&self) -> f64 {
        self.levels.first().copied().unwrap_or(0.0)
    }

    pub fn mismatched_field(&self, horizon: usize) -> Option<(&'static str, usize)> {
        [
            ("inventory.levels", self.levels.len()),
            ("inventory.safetyStock", self.safety_stock.len()),
            ("inventory.targets", self.targets.len()),
            ("inventory.holdingCost", self.holding_cost.len()),
        ]
        .into_iter()
        .find(|(_, len)| *len != horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_field_reports_first_bad_array() {
        let mut supply = SupplyModel::zeros(4);
        assert!(supply.mismatched_field(4).is_none());

        supply.unit_cost.pop();
        assert_eq!(supply.mismatched_field(4), Some(("supply.unitCost", 3)));
    }

    #[test]
    fn test_initial_level() {
        let mut inventory = InventoryModel::zeros(3);
        inventory.levels = vec![120.0, 80.0, 60.0];
        assert_eq!(inventory.initial_level(), 120.0);
        assert_eq!(InventoryModel::zeros(0).initial_level(), 0.0);
    }
}
