// ==========================================
// IBP 鲁棒评估引擎 - 目标评估器
// ==========================================
// 职责: 单个决策向量 × 全部情景 → 每个目标 N 个原始结果
// 依据: 逐期库存仿真，期初库存 = inventory.levels[0]
// ==========================================
// 评估器:
// - CostEvaluator: 生产/采购/持有/缺货/安全库存罚金
// - ServiceLevelEvaluator: 需求满足率
// - InventoryTurnsEvaluator: 年化库存周转
// - SustainabilityEvaluator: 产能利用 + 浪费 + 响应性
// ==========================================

mod cost;
mod inventory_turns;
mod service_level;
mod sustainability;

#[cfg(test)]
mod tests;

pub use cost::CostEvaluator;
pub use inventory_turns::InventoryTurnsEvaluator;
pub use service_level::ServiceLevelEvaluator;
pub use sustainability::SustainabilityEvaluator;

use crate::domain::{DecisionVector, DemandModel, InventoryModel, ObjectiveKind, ObjectiveRawSet, SupplyModel};
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// SimulationContext - 仿真上下文
// ==========================================
/// 一次评估所需的只读输入
#[derive(Debug, Clone, Copy)]
pub struct SimulationContext<'a> {
    pub decision: &'a DecisionVector,
    pub supply: &'a SupplyModel,
    pub inventory: &'a InventoryModel,
    pub demand: &'a DemandModel,
    pub horizon: usize,
}

impl<'a> SimulationContext<'a> {
    /// 构造并校验全部数组长度
    ///
    /// # 返回
    /// - Err(ConfigurationError): 任一数组长度 != H，或情景矩阵长度不是 H 的整数倍
    pub fn new(
        decision: &'a DecisionVector,
        supply: &'a SupplyModel,
        inventory: &'a InventoryModel,
        demand: &'a DemandModel,
        horizon: usize,
    ) -> EngineResult<Self> {
        if let Some((field, actual)) = decision.mismatched_field(horizon) {
            return Err(EngineError::length_mismatch(field, horizon, actual));
        }
        if let Some((field, actual)) = supply.mismatched_field(horizon) {
            return Err(EngineError::length_mismatch(field, horizon, actual));
        }
        if let Some((field, actual)) = inventory.mismatched_field(horizon) {
            return Err(EngineError::length_mismatch(field, horizon, actual));
        }
        if demand.forecast.len() != horizon {
            return Err(EngineError::length_mismatch("demand.forecast", horizon, demand.forecast.len()));
        }
        if horizon == 0 || demand.scenarios.len() % horizon != 0 {
            return Err(EngineError::length_mismatch(
                "demand.scenarios",
                demand.num_scenarios() * horizon,
                demand.scenarios.len(),
            ));
        }

        Ok(Self {
            decision,
            supply,
            inventory,
            demand,
            horizon,
        })
    }

    pub fn num_scenarios(&self) -> usize {
        self.demand.scenarios.len() / self.horizon
    }

    pub fn scenario_rows(&self) -> impl Iterator<Item = &'a [f64]> {
        self.demand.scenarios.chunks_exact(self.horizon)
    }
}

// ==========================================
// ObjectiveEvaluator Trait
// ==========================================
pub trait ObjectiveEvaluator: Send + Sync {
    /// 评估目标
    fn kind(&self) -> ObjectiveKind;

    /// 对单个情景行仿真，返回该情景的目标值
    fn evaluate_scenario(&self, ctx: &SimulationContext<'_>, demand_row: &[f64]) -> f64;

    /// 对全部情景仿真，返回长度 N 的原始结果
    fn evaluate(&self, ctx: &SimulationContext<'_>) -> Vec<f64> {
        ctx.scenario_rows()
            .map(|row| self.evaluate_scenario(ctx, row))
            .collect()
    }
}

/// 按目标类型取评估器
pub fn evaluator_for(kind: ObjectiveKind) -> Box<dyn ObjectiveEvaluator> {
    match kind {
        ObjectiveKind::Cost => Box::new(CostEvaluator::new()),
        ObjectiveKind::ServiceLevel => Box::new(ServiceLevelEvaluator::new()),
        ObjectiveKind::InventoryTurns => Box::new(InventoryTurnsEvaluator::new()),
        ObjectiveKind::Sustainability => Box::new(SustainabilityEvaluator::new()),
    }
}

/// 对指定目标集逐一评估
pub fn evaluate_all(ctx: &SimulationContext<'_>, objectives: &[ObjectiveKind]) -> ObjectiveRawSet {
    evaluate_all_with_progress(ctx, objectives, |_, _, _| {})
}

/// 逐一评估，每完成一个目标回调 (目标, 已完成数, 目标总数)
pub fn evaluate_all_with_progress<F>(
    ctx: &SimulationContext<'_>,
    objectives: &[ObjectiveKind],
    mut on_objective: F,
) -> ObjectiveRawSet
where
    F: FnMut(ObjectiveKind, usize, usize),
{
    let total = objectives.len();
    let mut raw = ObjectiveRawSet::new();
    for (done, kind) in objectives.iter().enumerate() {
        raw.insert(*kind, evaluator_for(*kind).evaluate(ctx));
        on_objective(*kind, done + 1, total);
    }
    raw
}
