// ==========================================
// IBP 鲁棒评估引擎 - 情景采样引擎
// ==========================================
// 职责: 由预测 + 标准差生成带序列相关的需求情景矩阵
// 输入: forecast[H], uncertainty[H], N, 均匀随机源
// 输出: scenarios[N*H] (行主序, 非负)
// ==========================================
// 算法:
// - Box–Muller: z = sqrt(-2 ln u1) * cos(2π u2), u1,u2 ∈ (0,1)
// - 行内 AR(1) 平滑: μ' = μ[t] + ρ (x[t-1] - μ[t]), t > 0
// - x[t] = max(0, μ' + σ[t] z)
// - 各情景行相互独立
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use rand::distributions::{Distribution, Open01};
use rand::Rng;
use std::f64::consts::PI;

/// 默认序列相关系数
pub const DEFAULT_SERIAL_CORRELATION: f64 = 0.3;

// ==========================================
// ScenarioSampler - 情景采样引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct ScenarioSampler {
    serial_correlation: f64,
}

impl ScenarioSampler {
    pub fn new() -> Self {
        Self::with_correlation(DEFAULT_SERIAL_CORRELATION)
    }

    pub fn with_correlation(serial_correlation: f64) -> Self {
        Self { serial_correlation }
    }

    pub fn serial_correlation(&self) -> f64 {
        self.serial_correlation
    }

    /// 生成情景矩阵
    ///
    /// # 参数
    /// - `rng`: 均匀随机源（注入确定性种子即可复现）
    /// - `forecast`: 每期需求均值
    /// - `uncertainty`: 每期需求标准差
    /// - `num_scenarios`: 情景数 N
    ///
    /// # 返回
    /// - Ok(Vec<f64>): 长度 N*H 的展平矩阵
    /// - Err(ConfigurationError): forecast 与 uncertainty 长度不一致
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        forecast: &[f64],
        uncertainty: &[f64],
        num_scenarios: usize,
    ) -> EngineResult<Vec<f64>> {
        self.sample_with_progress(rng, forecast, uncertainty, num_scenarios, |_, _| {})
    }

    /// 生成情景矩阵，并在每个情景行完成后回调 (已完成行数, 总行数)
    pub fn sample_with_progress<R, F>(
        &self,
        rng: &mut R,
        forecast: &[f64],
        uncertainty: &[f64],
        num_scenarios: usize,
        mut on_row: F,
    ) -> EngineResult<Vec<f64>>
    where
        R: Rng + ?Sized,
        F: FnMut(usize, usize),
    {
        let horizon = forecast.len();
        if uncertainty.len() != horizon {
            return Err(EngineError::length_mismatch(
                "demand.uncertainty",
                horizon,
                uncertainty.len(),
            ));
        }

        let mut scenarios = vec![0.0; num_scenarios * horizon];
        for (scenario, row) in scenarios.chunks_mut(horizon.max(1)).enumerate() {
            if horizon == 0 {
                break;
            }
            self.fill_row(rng, forecast, uncertainty, row);
            on_row(scenario + 1, num_scenarios);
        }

        Ok(scenarios)
    }

    /// 填充单个情景行
    fn fill_row<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        forecast: &[f64],
        uncertainty: &[f64],
        row: &mut [f64],
    ) {
        for period in 0..row.len() {
            let mean = forecast[period];
            let std_dev = uncertainty[period];
            let z = standard_normal(rng);

            let correlated_mean = if period > 0 {
                mean + self.serial_correlation * (row[period - 1] - mean)
            } else {
                mean
            };

            row[period] = (correlated_mean + std_dev * z).max(0.0);
        }
    }
}

impl Default for ScenarioSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Box–Muller 标准正态变量
///
/// u1 取自开区间 (0,1)，保证 ln(u1) 有限
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = Open01.sample(rng);
    let u2: f64 = Open01.sample(rng);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sample_shape_and_non_negative() {
        let sampler = ScenarioSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        // 高波动，强制触发截断
        let forecast = vec![10.0, 5.0, 1.0, 20.0];
        let uncertainty = vec![50.0, 50.0, 50.0, 50.0];

        let scenarios = sampler.sample(&mut rng, &forecast, &uncertainty, 250).unwrap();
        assert_eq!(scenarios.len(), 250 * 4);
        assert!(scenarios.iter().all(|v| *v >= 0.0));
        assert!(scenarios.iter().any(|v| *v == 0.0), "高波动下应出现截断为0的需求");
    }

    #[test]
    fn test_zero_variance_flat_forecast_is_exact() {
        let sampler = ScenarioSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let forecast = vec![1000.0; 6];
        let uncertainty = vec![0.0; 6];

        let scenarios = sampler.sample(&mut rng, &forecast, &uncertainty, 20).unwrap();
        assert!(scenarios.iter().all(|v| *v == 1000.0));
    }

    #[test]
    fn test_zero_variance_follows_smoothed_forecast() {
        let sampler = ScenarioSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let forecast = vec![100.0, 200.0, 300.0];
        let uncertainty = vec![0.0; 3];

        let scenarios = sampler.sample(&mut rng, &forecast, &uncertainty, 3).unwrap();
        // x1 = 200 + 0.3*(100-200) = 170; x2 = 300 + 0.3*(170-300) = 261
        let expected = [100.0, 170.0, 261.0];
        for row in scenarios.chunks(3) {
            for (actual, exp) in row.iter().zip(expected.iter()) {
                assert!((actual - exp).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_seeded_sampling_is_deterministic() {
        let sampler = ScenarioSampler::new();
        let forecast = vec![1000.0, 1100.0, 1200.0];
        let uncertainty = vec![120.0, 130.0, 140.0];

        let a = sampler
            .sample(&mut ChaCha8Rng::seed_from_u64(99), &forecast, &uncertainty, 50)
            .unwrap();
        let b = sampler
            .sample(&mut ChaCha8Rng::seed_from_u64(99), &forecast, &uncertainty, 50)
            .unwrap();
        assert_eq!(a, b);

        let c = sampler
            .sample(&mut ChaCha8Rng::seed_from_u64(100), &forecast, &uncertainty, 50)
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_length_mismatch_is_configuration_error() {
        let sampler = ScenarioSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = sampler
            .sample(&mut rng, &[1.0, 2.0, 3.0], &[1.0, 2.0], 10)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::ConfigurationError {
                field: "demand.uncertainty".to_string(),
                expected: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn test_progress_callback_per_row() {
        let sampler = ScenarioSampler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut seen = Vec::new();
        sampler
            .sample_with_progress(&mut rng, &[10.0, 10.0], &[1.0, 1.0], 4, |done, total| {
                seen.push((done, total))
            })
            .unwrap();
        assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[test]
    fn test_standard_normal_moments() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean={}", mean);
        assert!((var - 1.0).abs() < 0.05, "var={}", var);
    }
}
