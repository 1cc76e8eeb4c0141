// ==========================================
// IBP 鲁棒评估引擎 - 配置层
// ==========================================
// 职责: 规划配置与运行参数管理,支持环境变量覆写
// ==========================================

pub mod config_manager;
pub mod planning_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager, CvarTailMode, EvaluationSettings};
pub use planning_config::PlanningConfig;
