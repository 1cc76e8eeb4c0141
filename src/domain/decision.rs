// ==========================================
// IBP 鲁棒评估引擎 - 决策向量
// ==========================================
// 职责: 候选计划 (生产/采购/分销) 与可行性校验结果
// 红线: 每个字段长度必须等于规划期 H
// ==========================================

use crate::domain::types::DecisionVariable;
use serde::{Deserialize, Serialize};

/// 决策向量（候选计划）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionVector {
    pub production: Vec<f64>,
    pub procurement: Vec<f64>,
    pub distribution: Vec<f64>,
}

impl DecisionVector {
    pub fn zeros(horizon: usize) -> Self {
        Self {
            production: vec![0.0; horizon],
            procurement: vec![0.0; horizon],
            distribution: vec![0.0; horizon],
        }
    }

    /// 按决策变量读取字段
    pub fn field(&self, variable: DecisionVariable) -> &[f64] {
        match variable {
            DecisionVariable::Production => &self.production,
            DecisionVariable::Procurement => &self.procurement,
            DecisionVariable::Distribution => &self.distribution,
        }
    }

    /// 返回第一个长度与规划期不一致的字段 (字段名, 实际长度)
    pub fn mismatched_field(&self, horizon: usize) -> Option<(&'static str, usize)> {
        DecisionVariable::ALL
            .into_iter()
            .map(|v| (v.as_str(), self.field(v).len()))
            .find(|(_, len)| *len != horizon)
    }
}

/// 可行性违规
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Violation {
    /// 生产量超过产能
    CapacityViolation { period: usize, value: f64, limit: f64 },
    /// 决策量为负
    NonNegativity {
        period: usize,
        variable: DecisionVariable,
        value: f64,
    },
}

impl Violation {
    pub fn period(&self) -> usize {
        match self {
            Violation::CapacityViolation { period, .. } => *period,
            Violation::NonNegativity { period, .. } => *period,
        }
    }
}

/// 可行性校验报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    /// 1 - violations / (H * 3)，下限 0
    pub score: f64,
}

impl ValidationReport {
    pub fn from_violations(violations: Vec<Violation>, horizon: usize) -> Self {
        let denominator = (horizon * 3) as f64;
        let score = if denominator > 0.0 {
            (1.0 - violations.len() as f64 / denominator).max(0.0)
        } else {
            0.0
        };
        Self {
            is_valid: violations.is_empty(),
            violations,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_field() {
        let mut decision = DecisionVector::zeros(5);
        assert!(decision.mismatched_field(5).is_none());

        decision.procurement.push(1.0);
        assert_eq!(decision.mismatched_field(5), Some(("procurement", 6)));
    }

    #[test]
    fn test_validation_report_score() {
        let violations = vec![
            Violation::CapacityViolation { period: 0, value: 120.0, limit: 100.0 },
            Violation::NonNegativity {
                period: 1,
                variable: DecisionVariable::Procurement,
                value: -5.0,
            },
        ];
        let report = ValidationReport::from_violations(violations, 4);
        assert!(!report.is_valid);
        assert!((report.score - (1.0 - 2.0 / 12.0)).abs() < 1e-12);

        let clean = ValidationReport::from_violations(Vec::new(), 4);
        assert!(clean.is_valid);
        assert_eq!(clean.score, 1.0);
    }

    #[test]
    fn test_violation_serializes_with_type_tag() {
        let v = Violation::CapacityViolation { period: 2, value: 10.0, limit: 8.0 };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "capacity_violation");
        assert_eq!(json["period"], 2);
    }
}
