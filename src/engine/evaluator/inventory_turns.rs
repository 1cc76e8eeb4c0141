// ==========================================
// 库存周转目标评估器
// ==========================================
// 库存递推与服务水平相同
// 结果 = (Σsales / (Σinv期初 / H)) × (12 / H)，平均库存为 0 时为 0
// ==========================================

use super::{ObjectiveEvaluator, SimulationContext};
use crate::domain::ObjectiveKind;

const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Default)]
pub struct InventoryTurnsEvaluator;

impl InventoryTurnsEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl ObjectiveEvaluator for InventoryTurnsEvaluator {
    fn kind(&self) -> ObjectiveKind {
        ObjectiveKind::InventoryTurns
    }

    fn evaluate_scenario(&self, ctx: &SimulationContext<'_>, demand_row: &[f64]) -> f64 {
        let decision = ctx.decision;
        let horizon = ctx.horizon as f64;
        let mut total_sales = 0.0;
        let mut total_inventory = 0.0;
        let mut inventory = ctx.inventory.initial_level();

        for (period, &demand) in demand_row.iter().enumerate() {
            let available = inventory + decision.production[period] + decision.procurement[period];
            let sales = demand.min(available.max(0.0));

            total_sales += sales;
            total_inventory += inventory;

            inventory = (available - demand).max(0.0);
        }

        let avg_inventory = total_inventory / horizon;
        if avg_inventory > 0.0 {
            (total_sales / avg_inventory) * (MONTHS_PER_YEAR / horizon)
        } else {
            0.0
        }
    }
}
