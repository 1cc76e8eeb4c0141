// ==========================================
// IBP 鲁棒评估引擎 - 核心库
// ==========================================
// 系统定位: 需求不确定性下的供应链计划多目标评估
// 流程: 情景采样 → 逐情景仿真 → 鲁棒统计聚合
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 模型与类型
pub mod domain;

// 配置层 - 规划配置与运行参数
pub mod config;

// 引擎层 - 采样/仿真/聚合
pub mod engine;

// 缓存层
pub mod cache;

// 进度跟踪
pub mod progress;

// 离线执行层 - 后台采样通道
pub mod offload;

// API 层 - 加速评估门面
pub mod api;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    DecisionVariable, GenerationMethod, IndustryType, ObjectiveKind, OptimizationDirection, RiskTail,
    UncertaintyType,
};

// 领域模型
pub use domain::{
    DecisionVector, DemandModel, InventoryModel, ObjectiveEvaluation, RobustObjective, RobustObjectiveSet,
    ScenarioBundle, StateSnapshot, SupplyModel, ValidationReport, Violation,
};

// 配置
pub use config::{ConfigManager, CvarTailMode, EvaluationSettings, PlanningConfig};

// 引擎
pub use engine::{
    EngineError, PlanEvaluator, PlanningModel, RobustMetricsAggregator, ScenarioSampler,
};

// API
pub use api::{ApiError, ApiResult, PlanningApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "IBP 鲁棒评估引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
