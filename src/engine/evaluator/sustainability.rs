// ==========================================
// 可持续性目标评估器
// ==========================================
// 每期得分 = 0.4 × min(1, production / capacity)
//          + 0.35 × max(0, 1 - wasteRatio)
//          + 0.25 (响应性，常量)
// wasteRatio = max(0, (production + procurement - demand) / demand)
// 结果 = H 期平均得分
// 边界: demand == 0 时 wasteRatio = 0; capacity == 0 时利用率项为 0
// ==========================================

use super::{ObjectiveEvaluator, SimulationContext};
use crate::domain::ObjectiveKind;

const EFFICIENCY_WEIGHT: f64 = 0.4;
const WASTE_WEIGHT: f64 = 0.35;
const RESPONSIVENESS_SCORE: f64 = 0.25;

#[derive(Debug, Clone, Default)]
pub struct SustainabilityEvaluator;

impl SustainabilityEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn efficiency(production: f64, capacity: f64) -> f64 {
        if capacity > 0.0 {
            (production / capacity).min(1.0)
        } else {
            0.0
        }
    }

    fn waste_ratio(total_supply: f64, demand: f64) -> f64 {
        if demand > 0.0 {
            ((total_supply - demand) / demand).max(0.0)
        } else {
            0.0
        }
    }
}

impl ObjectiveEvaluator for SustainabilityEvaluator {
    fn kind(&self) -> ObjectiveKind {
        ObjectiveKind::Sustainability
    }

    fn evaluate_scenario(&self, ctx: &SimulationContext<'_>, demand_row: &[f64]) -> f64 {
        let decision = ctx.decision;
        let capacity = &ctx.supply.capacity;

        let score: f64 = demand_row
            .iter()
            .enumerate()
            .map(|(period, &demand)| {
                let production = decision.production[period];
                let total_supply = production + decision.procurement[period];

                Self::efficiency(production, capacity[period]) * EFFICIENCY_WEIGHT
                    + (1.0 - Self::waste_ratio(total_supply, demand)).max(0.0) * WASTE_WEIGHT
                    + RESPONSIVENESS_SCORE
            })
            .sum();

        score / ctx.horizon as f64
    }
}
