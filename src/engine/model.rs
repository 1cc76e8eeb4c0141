// ==========================================
// IBP 鲁棒评估引擎 - 基础规划模型
// ==========================================
// 职责: 持有需求/供应/库存/决策状态，串联 采样 → 评估 → 聚合
// 输入: PlanningConfig (构造后不可变) + EvaluationSettings
// 输出: RobustObjectiveSet / ValidationReport / StateSnapshot
// 红线: 所有数组长度 == H; scenarios.len() == N*H
// ==========================================
// 说明: 同步路径，无挂起点；注入种子时完全可复现
// ==========================================

use crate::config::{EvaluationSettings, PlanningConfig};
use crate::domain::{
    DecisionVariable, DecisionVector, DemandModel, DemandState, InventoryModel, InventoryState,
    ObjectiveKind, RobustObjectiveSet, StateSnapshot, SupplyModel, SupplyState,
    ValidationReport, Violation,
};
use crate::engine::aggregator::RobustMetricsAggregator;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::evaluator::{evaluate_all_with_progress, SimulationContext};
use crate::engine::events::{EventBus, ModelEvent, ModelEventKind, ModelEventListener, SubscriptionId};
use crate::engine::sampler::ScenarioSampler;
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

// ==========================================
// PlanEvaluator Trait - 评估能力接口
// ==========================================
/// 基础模型与加速门面共同实现的同步评估接口
pub trait PlanEvaluator {
    /// 重新生成情景矩阵
    fn sample(&mut self) -> EngineResult<()>;

    /// 基于预测与产能生成一个随机候选计划
    fn random_plan(&mut self) -> DecisionVector;

    /// 评估候选计划；None 表示评估当前决策
    fn evaluate(&mut self, decision: Option<&DecisionVector>) -> EngineResult<RobustObjectiveSet>;

    /// 可行性校验
    fn validate(&self, decision: &DecisionVector) -> EngineResult<ValidationReport>;

    fn export_state(&self) -> StateSnapshot;

    fn import_state(&mut self, snapshot: StateSnapshot) -> EngineResult<()>;
}

// ==========================================
// PlanningModel - 基础规划模型
// ==========================================
pub struct PlanningModel {
    config: PlanningConfig,
    settings: EvaluationSettings,
    demand: DemandModel,
    supply: SupplyModel,
    inventory: InventoryModel,
    decisions: DecisionVector,
    objectives: Option<RobustObjectiveSet>,
    sampler: ScenarioSampler,
    aggregator: RobustMetricsAggregator,
    rng: Box<dyn RngCore + Send>,
    // 情景/供应/库存变更时递增，评估结果缓存以此区分
    revision: u64,
    events: Arc<EventBus>,
}

impl PlanningModel {
    /// 创建模型: 校验配置 → 合成默认数据 → 生成情景
    pub fn new(config: PlanningConfig, settings: EvaluationSettings) -> EngineResult<Self> {
        config.validate().map_err(EngineError::InvalidConfigError)?;

        let rng: Box<dyn RngCore + Send> = match settings.scenario_seed {
            Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
            None => Box::new(SmallRng::from_entropy()),
        };

        let horizon = config.horizon_months;
        let mut model = Self {
            demand: DemandModel::zeros(horizon, config.num_scenarios),
            supply: SupplyModel::zeros(horizon),
            inventory: InventoryModel::zeros(horizon),
            decisions: DecisionVector::zeros(horizon),
            objectives: None,
            sampler: ScenarioSampler::with_correlation(settings.serial_correlation),
            aggregator: RobustMetricsAggregator::new(),
            rng,
            revision: 0,
            events: Arc::new(EventBus::new()),
            config,
            settings,
        };

        model.initialize_defaults();
        model.sample()?;

        info!(
            horizon = model.config.horizon_months,
            scenarios = model.config.num_scenarios,
            objectives = model.config.objectives.len(),
            seeded = model.settings.scenario_seed.is_some(),
            "规划模型初始化完成"
        );
        Ok(model)
    }

    /// 默认配置 + 默认运行参数
    pub fn with_defaults() -> EngineResult<Self> {
        Self::new(PlanningConfig::default(), EvaluationSettings::default())
    }

    // ==========================================
    // 只读访问
    // ==========================================

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    pub fn demand(&self) -> &DemandModel {
        &self.demand
    }

    pub fn supply(&self) -> &SupplyModel {
        &self.supply
    }

    pub fn inventory(&self) -> &InventoryModel {
        &self.inventory
    }

    pub fn decisions(&self) -> &DecisionVector {
        &self.decisions
    }

    /// 最近一次评估结果
    pub fn last_objectives(&self) -> Option<&RobustObjectiveSet> {
        self.objectives.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn horizon(&self) -> usize {
        self.config.horizon_months
    }

    pub fn num_scenarios(&self) -> usize {
        self.config.num_scenarios
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    pub fn subscribe(&self, kind: ModelEventKind, listener: Arc<dyn ModelEventListener>) -> SubscriptionId {
        self.events.subscribe(kind, listener)
    }

    pub fn unsubscribe(&self, kind: ModelEventKind, id: SubscriptionId) -> bool {
        self.events.unsubscribe(kind, id)
    }

    // ==========================================
    // 情景生成
    // ==========================================

    /// 生成情景，每完成一行回调 (已完成, 总数)
    pub fn sample_with_progress<F>(&mut self, on_row: F) -> EngineResult<()>
    where
        F: FnMut(usize, usize),
    {
        let started = Instant::now();
        let scenarios = self.sampler.sample_with_progress(
            &mut *self.rng,
            &self.demand.forecast,
            &self.demand.uncertainty,
            self.config.num_scenarios,
            on_row,
        )?;
        self.demand.scenarios = scenarios;
        self.revision += 1;

        debug!(
            scenarios = self.config.num_scenarios,
            horizon = self.config.horizon_months,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "情景矩阵已生成"
        );
        self.emit_scenarios_generated();
        Ok(())
    }

    /// 写入外部生成（离线通道/缓存）的情景矩阵
    pub fn install_scenarios(&mut self, scenarios: Vec<f64>) -> EngineResult<()> {
        let expected = self.config.matrix_len();
        if scenarios.len() != expected {
            return Err(EngineError::length_mismatch("demand.scenarios", expected, scenarios.len()));
        }
        self.demand.scenarios = scenarios;
        self.revision += 1;
        self.emit_scenarios_generated();
        Ok(())
    }

    fn emit_scenarios_generated(&self) {
        self.events.emit(&ModelEvent::ScenariosGenerated {
            num_scenarios: self.config.num_scenarios,
            horizon: self.config.horizon_months,
        });
    }

    // ==========================================
    // 外部数据更新
    // ==========================================

    /// 更新需求预测（可选同时更新标准差），并重新生成情景
    pub fn update_demand_forecast(&mut self, forecast: Vec<f64>, uncertainty: Option<Vec<f64>>) -> EngineResult<()> {
        let horizon = self.horizon();
        check_len("demand.forecast", horizon, forecast.len())?;
        if let Some(u) = &uncertainty {
            check_len("demand.uncertainty", horizon, u.len())?;
        }

        self.demand.forecast = forecast;
        if let Some(u) = uncertainty {
            self.demand.uncertainty = u;
        }
        self.sample()?;

        self.events.emit(&ModelEvent::DemandUpdated {
            forecast: self.demand.forecast.clone(),
            uncertainty: self.demand.uncertainty.clone(),
        });
        Ok(())
    }

    pub fn update_supply(&mut self, supply: SupplyModel) -> EngineResult<()> {
        if let Some((field, actual)) = supply.mismatched_field(self.horizon()) {
            return Err(EngineError::length_mismatch(field, self.horizon(), actual));
        }
        self.supply = supply;
        self.revision += 1;
        self.events.emit(&ModelEvent::SupplyUpdated(self.supply.clone()));
        Ok(())
    }

    pub fn update_inventory(&mut self, inventory: InventoryModel) -> EngineResult<()> {
        if let Some((field, actual)) = inventory.mismatched_field(self.horizon()) {
            return Err(EngineError::length_mismatch(field, self.horizon(), actual));
        }
        self.inventory = inventory;
        self.revision += 1;
        self.events.emit(&ModelEvent::InventoryUpdated(self.inventory.clone()));
        Ok(())
    }

    // ==========================================
    // 目标评估
    // ==========================================

    /// 评估候选计划，每完成一个目标回调 (目标, 已完成数, 目标总数)
    pub fn evaluate_with_progress<F>(
        &mut self,
        decision: Option<&DecisionVector>,
        mut on_objective: F,
    ) -> EngineResult<RobustObjectiveSet>
    where
        F: FnMut(ObjectiveKind, usize, usize),
    {
        if let Some(d) = decision {
            self.check_decision(d)?;
            self.decisions = d.clone();
        }

        let started = Instant::now();
        let ctx = SimulationContext::new(
            &self.decisions,
            &self.supply,
            &self.inventory,
            &self.demand,
            self.config.horizon_months,
        )?;

        let raw = evaluate_all_with_progress(&ctx, &self.config.objectives, &mut on_objective);
        let objectives = self.aggregator.aggregate_set(&raw, self.settings.cvar_tail_mode)?;

        debug!(
            objectives = objectives.len(),
            scenarios = ctx.num_scenarios(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "目标评估完成"
        );

        self.record_objectives(objectives.clone());
        Ok(objectives)
    }

    /// 采用外部（缓存）评估结果: 校验并写入决策与目标
    pub fn restore_evaluation(
        &mut self,
        decision: Option<&DecisionVector>,
        objectives: RobustObjectiveSet,
    ) -> EngineResult<()> {
        if let Some(d) = decision {
            self.check_decision(d)?;
            self.decisions = d.clone();
        }
        self.record_objectives(objectives);
        Ok(())
    }

    fn record_objectives(&mut self, objectives: RobustObjectiveSet) {
        if self.events.subscriber_count(ModelEventKind::ObjectivesEvaluated) > 0 {
            self.events.emit(&ModelEvent::ObjectivesEvaluated {
                decision: self.decisions.clone(),
                objectives: objectives.clone(),
            });
        }
        self.objectives = Some(objectives);
    }

    /// 离线采样使用的种子: 模型注入种子时从模型随机源派生，否则为 None
    pub fn next_offload_seed(&mut self) -> Option<u64> {
        self.settings.scenario_seed.map(|_| self.rng.next_u64())
    }

    // ==========================================
    // 合成默认数据
    // ==========================================

    /// 按期生成示意性默认数据（季节性 + 趋势 + 随机扰动）
    fn initialize_defaults(&mut self) {
        let horizon = self.horizon();
        let rng = &mut *self.rng;

        for i in 0..horizon {
            let season = (2.0 * PI * i as f64 / 12.0).sin();
            let forecast = 1000.0 + 200.0 * season + 50.0 * i as f64 + rng.gen::<f64>() * 100.0;

            self.demand.forecast[i] = forecast;
            self.demand.uncertainty[i] = forecast * (0.12 + rng.gen::<f64>() * 0.08);

            self.supply.capacity[i] = (forecast * (1.1 + rng.gen::<f64>() * 0.3)).max(800.0);
            self.supply.unit_cost[i] = 45.0 + 10.0 * rng.gen::<f64>() + 5.0 * season;
            self.supply.lead_times[i] = 2.0 + 3.0 * rng.gen::<f64>();

            self.inventory.levels[i] = 150.0 + 200.0 * rng.gen::<f64>();
            self.inventory.holding_cost[i] = 4.0 + 3.0 * rng.gen::<f64>();
            self.inventory.safety_stock[i] = forecast * 0.15;
            self.inventory.targets[i] = forecast * 0.25;
        }
        self.demand.historical = vec![0.0; horizon * 12];
    }

    /// 按全部数组长度校验决策向量
    fn check_decision(&self, decision: &DecisionVector) -> EngineResult<()> {
        match decision.mismatched_field(self.horizon()) {
            Some((field, actual)) => Err(EngineError::length_mismatch(field, self.horizon(), actual)),
            None => Ok(()),
        }
    }

    /// 快照中各数组对目标规划期的长度校验（导入前整体校验，不做部分写入）
    fn check_snapshot(snapshot: &StateSnapshot) -> EngineResult<()> {
        let h = snapshot.config.horizon_months;
        if let Some(d) = &snapshot.demand {
            check_len("demand.forecast", h, d.forecast.len())?;
            check_len("demand.uncertainty", h, d.uncertainty.len())?;
        }
        if let Some(s) = &snapshot.supply {
            check_len("supply.capacity", h, s.capacity.len())?;
            check_len("supply.unitCost", h, s.unit_cost.len())?;
            check_len("supply.leadTimes", h, s.lead_times.len())?;
        }
        if let Some(inv) = &snapshot.inventory {
            check_len("inventory.levels", h, inv.levels.len())?;
            check_len("inventory.targets", h, inv.targets.len())?;
            check_len("inventory.safetyStock", h, inv.safety_stock.len())?;
            if let Some(hc) = &inv.holding_cost {
                check_len("inventory.holdingCost", h, hc.len())?;
            }
        }
        if let Some(decision) = &snapshot.decisions {
            if let Some((field, actual)) = decision.mismatched_field(h) {
                return Err(EngineError::length_mismatch(field, h, actual));
            }
        }
        Ok(())
    }

    /// 以新配置重新初始化（保留运行参数、随机源与订阅者）
    fn reinitialize(&mut self, config: PlanningConfig) {
        let horizon = config.horizon_months;
        info!(
            old_horizon = self.config.horizon_months,
            new_horizon = horizon,
            new_scenarios = config.num_scenarios,
            "配置变更，重新初始化模型"
        );
        self.demand = DemandModel::zeros(horizon, config.num_scenarios);
        self.supply = SupplyModel::zeros(horizon);
        self.inventory = InventoryModel::zeros(horizon);
        self.decisions = DecisionVector::zeros(horizon);
        self.objectives = None;
        self.config = config;
        self.initialize_defaults();
    }
}

impl PlanEvaluator for PlanningModel {
    fn sample(&mut self) -> EngineResult<()> {
        self.sample_with_progress(|_, _| {})
    }

    fn random_plan(&mut self) -> DecisionVector {
        let horizon = self.horizon();
        let rng = &mut *self.rng;
        let mut plan = DecisionVector::zeros(horizon);

        for i in 0..horizon {
            let forecast = self.demand.forecast[i];
            plan.production[i] = self.supply.capacity[i].min(forecast * (0.7 + rng.gen::<f64>() * 0.6));
            plan.procurement[i] = forecast * (0.1 + rng.gen::<f64>() * 0.3);
            plan.distribution[i] = plan.production[i] * (0.85 + rng.gen::<f64>() * 0.15);
        }
        plan
    }

    fn evaluate(&mut self, decision: Option<&DecisionVector>) -> EngineResult<RobustObjectiveSet> {
        self.evaluate_with_progress(decision, |_, _, _| {})
    }

    fn validate(&self, decision: &DecisionVector) -> EngineResult<ValidationReport> {
        self.check_decision(decision)?;

        let mut violations = Vec::new();
        for period in 0..self.horizon() {
            let production = decision.production[period];
            let limit = self.supply.capacity[period];
            if production > limit {
                violations.push(Violation::CapacityViolation {
                    period,
                    value: production,
                    limit,
                });
            }

            for variable in DecisionVariable::ALL {
                let value = decision.field(variable)[period];
                if value < 0.0 {
                    violations.push(Violation::NonNegativity { period, variable, value });
                }
            }
        }

        Ok(ValidationReport::from_violations(violations, self.horizon()))
    }

    fn export_state(&self) -> StateSnapshot {
        StateSnapshot {
            config: self.config.clone(),
            demand: Some(DemandState {
                forecast: self.demand.forecast.clone(),
                uncertainty: self.demand.uncertainty.clone(),
            }),
            supply: Some(SupplyState {
                capacity: self.supply.capacity.clone(),
                unit_cost: self.supply.unit_cost.clone(),
                lead_times: self.supply.lead_times.clone(),
            }),
            inventory: Some(InventoryState {
                levels: self.inventory.levels.clone(),
                targets: self.inventory.targets.clone(),
                safety_stock: self.inventory.safety_stock.clone(),
                holding_cost: Some(self.inventory.holding_cost.clone()),
            }),
            decisions: Some(self.decisions.clone()),
            objectives: self.objectives.clone(),
        }
    }

    fn import_state(&mut self, snapshot: StateSnapshot) -> EngineResult<()> {
        snapshot.config.validate().map_err(EngineError::InvalidConfigError)?;
        Self::check_snapshot(&snapshot)?;

        if snapshot.config != self.config {
            self.reinitialize(snapshot.config);
        }

        if let Some(demand) = snapshot.demand {
            self.demand.forecast = demand.forecast;
            self.demand.uncertainty = demand.uncertainty;
        }
        if let Some(supply) = snapshot.supply {
            self.supply.capacity = supply.capacity;
            self.supply.unit_cost = supply.unit_cost;
            self.supply.lead_times = supply.lead_times;
        }
        if let Some(inventory) = snapshot.inventory {
            self.inventory.levels = inventory.levels;
            self.inventory.targets = inventory.targets;
            self.inventory.safety_stock = inventory.safety_stock;
            if let Some(holding_cost) = inventory.holding_cost {
                self.inventory.holding_cost = holding_cost;
            }
        }
        if let Some(decisions) = snapshot.decisions {
            self.decisions = decisions;
        }
        if snapshot.objectives.is_some() {
            self.objectives = snapshot.objectives;
        }

        self.sample()?;
        self.events.emit(&ModelEvent::StateImported(Box::new(self.export_state())));
        Ok(())
    }
}

fn check_len(field: &str, expected: usize, actual: usize) -> EngineResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(EngineError::length_mismatch(field, expected, actual))
    }
}
