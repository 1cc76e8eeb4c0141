// ==========================================
// IBP 鲁棒评估引擎 - 需求模型
// ==========================================
// 职责: 需求预测、标准差、情景矩阵
// 红线: scenarios.len() == num_scenarios * horizon 恒成立
// ==========================================

use serde::{Deserialize, Serialize};

/// 需求模型
///
/// `scenarios` 为按行展平的情景矩阵: index = scenario * H + period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandModel {
    /// 每期需求预测
    pub forecast: Vec<f64>,
    /// 每期需求标准差
    pub uncertainty: Vec<f64>,
    /// 展平的情景矩阵 (N*H)
    pub scenarios: Vec<f64>,
    /// 历史需求（仅供展示，不参与计算）
    pub historical: Vec<f64>,
}

impl DemandModel {
    /// 创建全零需求模型
    pub fn zeros(horizon: usize, num_scenarios: usize) -> Self {
        Self {
            forecast: vec![0.0; horizon],
            uncertainty: vec![0.0; horizon],
            scenarios: vec![0.0; num_scenarios * horizon],
            historical: vec![0.0; horizon * 12],
        }
    }

    /// 规划期长度
    pub fn horizon(&self) -> usize {
        self.forecast.len()
    }

    /// 情景数（由矩阵大小反推）
    pub fn num_scenarios(&self) -> usize {
        let horizon = self.horizon();
        if horizon == 0 {
            0
        } else {
            self.scenarios.len() / horizon
        }
    }

    /// 读取单个情景行
    pub fn scenario_row(&self, scenario: usize) -> &[f64] {
        let horizon = self.horizon();
        let start = scenario * horizon;
        &self.scenarios[start..start + horizon]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_shape() {
        let demand = DemandModel::zeros(6, 10);
        assert_eq!(demand.horizon(), 6);
        assert_eq!(demand.scenarios.len(), 60);
        assert_eq!(demand.num_scenarios(), 10);
        assert_eq!(demand.historical.len(), 72);
    }

    #[test]
    fn test_scenario_row_slices_by_horizon() {
        let mut demand = DemandModel::zeros(3, 2);
        demand.scenarios = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(demand.scenario_row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(demand.scenario_row(1), &[4.0, 5.0, 6.0]);
    }
}
