// ==========================================
// IBP 鲁棒评估引擎 - 领域模型层
// ==========================================
// 职责: 定义需求/供应/库存/决策/目标等值类型
// 红线: 不含仿真逻辑,不含并发逻辑
// ==========================================

pub mod decision;
pub mod demand;
pub mod objective;
pub mod scenario;
pub mod state;
pub mod supply;
pub mod types;

// 重导出核心类型
pub use decision::{DecisionVector, ValidationReport, Violation};
pub use demand::DemandModel;
pub use objective::{ObjectiveRawSet, RobustObjective, RobustObjectiveSet};
pub use scenario::{ObjectiveEvaluation, ScenarioBundle, ScenarioMetadata};
pub use state::{DemandState, InventoryState, StateSnapshot, SupplyState};
pub use supply::{InventoryModel, SupplyModel};
pub use types::{
    DecisionVariable, GenerationMethod, IndustryType, ObjectiveKind, OptimizationDirection,
    RiskTail, UncertaintyType,
};
