// ==========================================
// IBP 鲁棒评估引擎 - 评估结果期望校验
// ==========================================
// 职责: 场景测试的期望值核对 (服务水平下限 / 成本区间)
// 说明: 缺失的目标按均值 0 处理
// ==========================================

use crate::domain::RobustObjectiveSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 场景期望值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedResults {
    /// 服务水平均值下限
    #[serde(default)]
    pub service_level_min: Option<f64>,
    /// 成本均值区间 [min, max]
    #[serde(default)]
    pub cost_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// 单项核对明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationDetail {
    pub metric: String,
    pub actual: f64,
    pub expected: String,
    pub status: CheckStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationReport {
    pub passed: bool,
    pub details: Vec<ExpectationDetail>,
}

/// 核对评估结果是否满足期望
pub fn check_expectations(objectives: &RobustObjectiveSet, expected: &ExpectedResults) -> ExpectationReport {
    let mut details = Vec::new();

    if let Some(min) = expected.service_level_min {
        let actual = objectives.service_level().map(|o| o.mean).unwrap_or(0.0);
        details.push(ExpectationDetail {
            metric: "Service Level".to_string(),
            actual,
            expected: format!("{}", min),
            status: status_of(actual >= min),
        });
    }

    if let Some((min, max)) = expected.cost_range {
        let actual = objectives.cost().map(|o| o.mean).unwrap_or(0.0);
        details.push(ExpectationDetail {
            metric: "Total Cost".to_string(),
            actual,
            expected: format!("[{}, {}]", min, max),
            status: status_of(actual >= min && actual <= max),
        });
    }

    ExpectationReport {
        passed: details.iter().all(|d| d.status == CheckStatus::Pass),
        details,
    }
}

fn status_of(ok: bool) -> CheckStatus {
    if ok {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ObjectiveKind, RobustObjective};

    fn objective(mean: f64) -> RobustObjective {
        RobustObjective {
            mean,
            std_dev: 0.0,
            min: mean,
            max: mean,
            median: mean,
            q25: mean,
            q75: mean,
            cvar90: mean,
            cvar95: mean,
            raw_scenarios: vec![mean],
        }
    }

    fn objectives(cost: f64, service: f64) -> RobustObjectiveSet {
        let mut set = RobustObjectiveSet::new();
        set.insert(ObjectiveKind::Cost, objective(cost));
        set.insert(ObjectiveKind::ServiceLevel, objective(service));
        set
    }

    #[test]
    fn test_all_checks_pass() {
        let expected = ExpectedResults {
            service_level_min: Some(0.9),
            cost_range: Some((1000.0, 2000.0)),
        };
        let report = check_expectations(&objectives(1500.0, 0.95), &expected);
        assert!(report.passed);
        assert_eq!(report.details.len(), 2);
        assert_eq!(report.details[1].expected, "[1000, 2000]");
    }

    #[test]
    fn test_cost_out_of_range_fails() {
        let expected = ExpectedResults {
            service_level_min: Some(0.9),
            cost_range: Some((1000.0, 2000.0)),
        };
        let report = check_expectations(&objectives(2500.0, 0.95), &expected);
        assert!(!report.passed);
        assert_eq!(report.details[0].status, CheckStatus::Pass);
        assert_eq!(report.details[1].status, CheckStatus::Fail);
    }

    #[test]
    fn test_no_expectations_passes() {
        let report = check_expectations(&RobustObjectiveSet::new(), &ExpectedResults::default());
        assert!(report.passed);
        assert!(report.details.is_empty());
    }

    #[test]
    fn test_missing_objective_counts_as_zero() {
        let expected = ExpectedResults {
            service_level_min: Some(0.5),
            cost_range: None,
        };
        let report = check_expectations(&RobustObjectiveSet::new(), &expected);
        assert!(!report.passed);
        assert_eq!(report.details[0].actual, 0.0);
    }
}
