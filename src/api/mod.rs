// ==========================================
// IBP 鲁棒评估引擎 - API 层
// ==========================================
// 职责: 加速评估门面、外部数据源接入、统一错误
// ==========================================

pub mod data_source;
pub mod error;
pub mod planning_api;

// 重导出核心类型
pub use data_source::{PlanningDataSource, PlanningDataset, StaticDataSource};
pub use error::{ApiError, ApiResult};
pub use planning_api::{FeatureFlags, ModelSummary, PerformanceReport, PlanningApi};
