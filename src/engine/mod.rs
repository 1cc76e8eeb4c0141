// ==========================================
// IBP 鲁棒评估引擎 - 引擎层
// ==========================================
// 职责: 情景采样、目标仿真、鲁棒聚合、基础模型
// 依据: 同步数值路径，不含缓存与离线逻辑
// ==========================================

pub mod aggregator;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod expectations;
pub mod model;
pub mod sampler;

// 重导出核心引擎
pub use aggregator::RobustMetricsAggregator;
pub use error::{EngineError, EngineResult};
pub use evaluator::{
    evaluate_all, evaluate_all_with_progress, evaluator_for, CostEvaluator, InventoryTurnsEvaluator, ObjectiveEvaluator, ServiceLevelEvaluator,
    SimulationContext, SustainabilityEvaluator,
};
pub use events::{EventBus, ModelEvent, ModelEventKind, ModelEventListener, SubscriptionId};
pub use expectations::{check_expectations, CheckStatus, ExpectationDetail, ExpectationReport, ExpectedResults};
pub use model::{PlanEvaluator, PlanningModel};
pub use sampler::{standard_normal, ScenarioSampler};
