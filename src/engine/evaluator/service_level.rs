// ==========================================
// 服务水平目标评估器
// ==========================================
// available = inv + production + procurement
// met = min(demand, max(0, available))
// 结果 = Σmet / Σdemand（总需求为 0 时为 1.0）
// ==========================================

use super::{ObjectiveEvaluator, SimulationContext};
use crate::domain::ObjectiveKind;

#[derive(Debug, Clone, Default)]
pub struct ServiceLevelEvaluator;

impl ServiceLevelEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl ObjectiveEvaluator for ServiceLevelEvaluator {
    fn kind(&self) -> ObjectiveKind {
        ObjectiveKind::ServiceLevel
    }

    fn evaluate_scenario(&self, ctx: &SimulationContext<'_>, demand_row: &[f64]) -> f64 {
        let decision = ctx.decision;
        let mut total_demand = 0.0;
        let mut met_demand = 0.0;
        let mut inventory = ctx.inventory.initial_level();

        for (period, &demand) in demand_row.iter().enumerate() {
            let available = inventory + decision.production[period] + decision.procurement[period];
            let met = demand.min(available.max(0.0));

            total_demand += demand;
            met_demand += met;

            inventory = (available - demand).max(0.0);
        }

        if total_demand > 0.0 {
            met_demand / total_demand
        } else {
            1.0
        }
    }
}
