// ==========================================
// IBP 鲁棒评估引擎 - 鲁棒指标聚合器
// ==========================================
// 职责: 单目标 N 个原始结果 → 均值/分位数/CVaR
// 口径:
// - stdDev 为总体标准差 (除以 N)
// - median = sorted[N/2]，偶数 N 不取中间两数均值
// - q25 = sorted[floor(0.25N)], q75 = sorted[floor(0.75N)]
// - CVaR(p) 上尾 = mean(sorted[floor(pN) ..])
// - CVaR(p) 下尾 = mean(sorted[.. N - floor(pN)])
// ==========================================

use crate::config::CvarTailMode;
use crate::domain::{ObjectiveRawSet, RiskTail, RobustObjective, RobustObjectiveSet};
use crate::engine::error::{EngineError, EngineResult};

const CVAR_90: f64 = 0.90;
const CVAR_95: f64 = 0.95;

// ==========================================
// RobustMetricsAggregator - 鲁棒指标聚合器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RobustMetricsAggregator;

impl RobustMetricsAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 聚合单个目标
    ///
    /// # 参数
    /// - `name`: 目标名（仅用于错误信息）
    /// - `raw`: 长度 N 的原始结果
    /// - `tail`: CVaR 取哪一侧尾部
    pub fn aggregate(&self, name: &str, raw: &[f64], tail: RiskTail) -> EngineResult<RobustObjective> {
        let n = raw.len();
        if n == 0 {
            return Err(EngineError::EmptyScenarioSetError(name.to_string()));
        }

        let mut sorted = raw.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = n as f64;
        let mean = sorted.iter().sum::<f64>() / count;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

        Ok(RobustObjective {
            mean,
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[n - 1],
            median: sorted[n / 2],
            q25: sorted[quantile_index(n, 0.25)],
            q75: sorted[quantile_index(n, 0.75)],
            cvar90: cvar(&sorted, CVAR_90, tail),
            cvar95: cvar(&sorted, CVAR_95, tail),
            raw_scenarios: raw.to_vec(),
        })
    }

    /// 聚合目标集合，尾部方向由 CVaR 口径决定
    pub fn aggregate_set(&self, raw_set: &ObjectiveRawSet, mode: CvarTailMode) -> EngineResult<RobustObjectiveSet> {
        let mut set = RobustObjectiveSet::new();
        for (kind, raw) in raw_set {
            let objective = self.aggregate(kind.as_str(), raw, mode.tail_for(*kind))?;
            set.insert(*kind, objective);
        }
        Ok(set)
    }
}

fn quantile_index(n: usize, p: f64) -> usize {
    ((n as f64 * p).floor() as usize).min(n - 1)
}

/// 排序数组的尾部均值（sorted 非空）
fn cvar(sorted: &[f64], p: f64, tail: RiskTail) -> f64 {
    let n = sorted.len();
    let cut = quantile_index(n, p);
    let slice = match tail {
        RiskTail::Upper => &sorted[cut..],
        RiskTail::Lower => &sorted[..n - cut],
    };
    slice.iter().sum::<f64>() / slice.len() as f64
}
