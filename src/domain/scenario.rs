// ==========================================
// IBP 鲁棒评估引擎 - 情景包与评估结果
// ==========================================
// 职责: 异步接口的返回载体，带生成方式标注
// ==========================================

use crate::domain::objective::RobustObjectiveSet;
use crate::domain::types::GenerationMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 情景生成元信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMetadata {
    pub generated_at: DateTime<Utc>,
    pub method: GenerationMethod,
}

/// 情景包
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioBundle {
    /// 展平的情景矩阵 (N*H)
    pub scenarios: Vec<f64>,
    pub num_scenarios: usize,
    pub horizon_months: usize,
    pub metadata: ScenarioMetadata,
}

impl ScenarioBundle {
    pub fn new(
        scenarios: Vec<f64>,
        num_scenarios: usize,
        horizon_months: usize,
        method: GenerationMethod,
    ) -> Self {
        Self {
            scenarios,
            num_scenarios,
            horizon_months,
            metadata: ScenarioMetadata {
                generated_at: Utc::now(),
                method,
            },
        }
    }

    /// 复制一份并改写生成方式（缓存命中时使用）
    pub fn with_method(&self, method: GenerationMethod) -> Self {
        let mut bundle = self.clone();
        bundle.metadata.method = method;
        bundle
    }
}

/// 目标评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveEvaluation {
    pub objectives: RobustObjectiveSet,
    pub method: GenerationMethod,
    pub evaluated_at: DateTime<Utc>,
}

impl ObjectiveEvaluation {
    pub fn new(objectives: RobustObjectiveSet, method: GenerationMethod) -> Self {
        Self {
            objectives,
            method,
            evaluated_at: Utc::now(),
        }
    }
}
