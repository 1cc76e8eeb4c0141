// ==========================================
// IBP 鲁棒评估引擎 - 规划配置
// ==========================================
// 职责: 规划期/情景数/目标集/不确定性类型 + 行业预设
// 红线: 模型构造后不可变，变更需重新初始化
// ==========================================

use crate::domain::types::{IndustryType, ObjectiveKind, UncertaintyType};
use serde::{Deserialize, Serialize};

/// 规划配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningConfig {
    /// 规划期长度 H（月）
    pub horizon_months: usize,
    /// 情景数 N
    pub num_scenarios: usize,
    /// 参与评估的目标集
    pub objectives: Vec<ObjectiveKind>,
    /// 不确定性类型（元数据）
    pub uncertainty_types: Vec<UncertaintyType>,
    /// 行业类型（由预设填充）
    #[serde(default)]
    pub industry_type: Option<IndustryType>,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            horizon_months: 18,
            num_scenarios: 500,
            objectives: ObjectiveKind::ALL.to_vec(),
            uncertainty_types: vec![
                UncertaintyType::Demand,
                UncertaintyType::Supply,
                UncertaintyType::LeadTime,
                UncertaintyType::Cost,
            ],
            industry_type: None,
        }
    }
}

impl PlanningConfig {
    /// 按行业预设创建配置
    ///
    /// | 行业 | H | N | 目标 |
    /// |---|---|---|---|
    /// | manufacturing | 18 | 500 | 全部 |
    /// | retail | 12 | 750 | cost / serviceLevel / inventoryTurns |
    /// | distribution | 24 | 400 | cost / serviceLevel / sustainability |
    pub fn for_industry(industry: IndustryType) -> Self {
        match industry {
            IndustryType::Manufacturing => Self {
                horizon_months: 18,
                num_scenarios: 500,
                objectives: ObjectiveKind::ALL.to_vec(),
                uncertainty_types: vec![
                    UncertaintyType::Demand,
                    UncertaintyType::Supply,
                    UncertaintyType::LeadTime,
                ],
                industry_type: Some(industry),
            },
            IndustryType::Retail => Self {
                horizon_months: 12,
                num_scenarios: 750,
                objectives: vec![
                    ObjectiveKind::Cost,
                    ObjectiveKind::ServiceLevel,
                    ObjectiveKind::InventoryTurns,
                ],
                uncertainty_types: vec![
                    UncertaintyType::Demand,
                    UncertaintyType::LeadTime,
                    UncertaintyType::Cost,
                ],
                industry_type: Some(industry),
            },
            IndustryType::Distribution => Self {
                horizon_months: 24,
                num_scenarios: 400,
                objectives: vec![
                    ObjectiveKind::Cost,
                    ObjectiveKind::ServiceLevel,
                    ObjectiveKind::Sustainability,
                ],
                uncertainty_types: vec![
                    UncertaintyType::Demand,
                    UncertaintyType::Supply,
                    UncertaintyType::Transportation,
                ],
                industry_type: Some(industry),
            },
        }
    }

    pub fn with_horizon(mut self, horizon_months: usize) -> Self {
        self.horizon_months = horizon_months;
        self
    }

    pub fn with_scenarios(mut self, num_scenarios: usize) -> Self {
        self.num_scenarios = num_scenarios;
        self
    }

    pub fn with_objectives(mut self, objectives: Vec<ObjectiveKind>) -> Self {
        self.objectives = objectives;
        self
    }

    /// 基本合法性校验
    pub fn validate(&self) -> Result<(), String> {
        if self.horizon_months == 0 {
            return Err("horizon_months 必须大于 0".to_string());
        }
        if self.num_scenarios == 0 {
            return Err("num_scenarios 必须大于 0".to_string());
        }
        if self.objectives.is_empty() {
            return Err("objectives 不能为空".to_string());
        }
        Ok(())
    }

    /// 矩阵大小 N*H
    pub fn matrix_len(&self) -> usize {
        self.horizon_months * self.num_scenarios
    }
}
