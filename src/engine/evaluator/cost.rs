// ==========================================
// 成本目标评估器
// ==========================================
// 每期成本:
//   生产 = production × unitCost
//   采购 = procurement × unitCost × 0.9
//   持有 = max(0, inv) × holdingCost × 0.02
//   缺货 = max(0, -inv) × unitCost × 8
//   安全库存罚金 = max(0, safetyStock - inv) × unitCost × 2
// inv 先按本期收支更新，罚金基于未截断值计算，下一期前截断为非负
// ==========================================

use super::{ObjectiveEvaluator, SimulationContext};
use crate::domain::ObjectiveKind;

const PROCUREMENT_COST_FACTOR: f64 = 0.9;
const HOLDING_COST_RATE: f64 = 0.02;
const SHORTAGE_PENALTY_FACTOR: f64 = 8.0;
const SAFETY_STOCK_PENALTY_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, Default)]
pub struct CostEvaluator;

impl CostEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl ObjectiveEvaluator for CostEvaluator {
    fn kind(&self) -> ObjectiveKind {
        ObjectiveKind::Cost
    }

    fn evaluate_scenario(&self, ctx: &SimulationContext<'_>, demand_row: &[f64]) -> f64 {
        let decision = ctx.decision;
        let unit_cost = &ctx.supply.unit_cost;
        let holding_cost = &ctx.inventory.holding_cost;
        let safety_stock = &ctx.inventory.safety_stock;

        let mut total_cost = 0.0;
        let mut inventory = ctx.inventory.initial_level();

        for (period, demand) in demand_row.iter().enumerate() {
            let production = decision.production[period];
            let procurement = decision.procurement[period];
            let cost = unit_cost[period];

            inventory += production + procurement - demand;

            total_cost += production * cost
                + procurement * cost * PROCUREMENT_COST_FACTOR
                + inventory.max(0.0) * holding_cost[period] * HOLDING_COST_RATE
                + (-inventory).max(0.0) * cost * SHORTAGE_PENALTY_FACTOR
                + (safety_stock[period] - inventory).max(0.0) * cost * SAFETY_STOCK_PENALTY_FACTOR;

            inventory = inventory.max(0.0);
        }

        total_cost
    }
}
