// ==========================================
// IBP 鲁棒评估引擎 - 蒙特卡洛采样处理器
// ==========================================
// 职责: 在后台线程上生成情景矩阵
// 进度: 每完成 max(1, floor(N/100)) 个情景发送一次进度帧
// ==========================================

use crate::engine::ScenarioSampler;
use crate::offload::handler::{FrameSink, TaskHandler};
use crate::offload::protocol::{MonteCarloRequest, MonteCarloResult, TaskRequest};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

/// 蒙特卡洛通道名
pub const MONTE_CARLO_TASK: &str = "monte-carlo";

#[derive(Debug, Clone, Default)]
pub struct MonteCarloHandler {
    sampler: ScenarioSampler,
}

impl MonteCarloHandler {
    pub fn new(serial_correlation: f64) -> Self {
        Self {
            sampler: ScenarioSampler::with_correlation(serial_correlation),
        }
    }

    /// 执行采样（不经过通道，供同步调用与测试使用）
    pub fn run(&self, request: &MonteCarloRequest, sink: Option<&FrameSink>) -> Result<MonteCarloResult, String> {
        if request.forecast.len() != request.horizon_months {
            return Err(format!(
                "forecast 长度 {} 与 horizonMonths {} 不一致",
                request.forecast.len(),
                request.horizon_months
            ));
        }

        let mut rng: Box<dyn RngCore> = match request.seed {
            Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
            None => Box::new(SmallRng::from_entropy()),
        };
        let step = (request.num_scenarios / 100).max(1);

        let scenarios = self
            .sampler
            .sample_with_progress(
                &mut *rng,
                &request.forecast,
                &request.uncertainty,
                request.num_scenarios,
                |done, total| {
                    if let Some(sink) = sink {
                        if done % step == 0 || done == total {
                            sink.progress(done, total);
                        }
                    }
                },
            )
            .map_err(|e| e.to_string())?;

        Ok(MonteCarloResult {
            scenarios,
            num_scenarios: request.num_scenarios,
            horizon_months: request.horizon_months,
        })
    }
}

impl TaskHandler for MonteCarloHandler {
    fn task_type(&self) -> &str {
        MONTE_CARLO_TASK
    }

    fn handle(&self, request: &TaskRequest, sink: &FrameSink) -> Result<Value, String> {
        let payload: MonteCarloRequest =
            serde_json::from_value(request.data.clone()).map_err(|e| format!("请求负载解析失败: {}", e))?;
        let result = self.run(&payload, Some(sink))?;
        serde_json::to_value(result).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offload::protocol::WorkerMessage;

    fn request(seed: Option<u64>) -> MonteCarloRequest {
        MonteCarloRequest {
            num_scenarios: 250,
            horizon_months: 3,
            forecast: vec![100.0, 120.0, 140.0],
            uncertainty: vec![10.0, 12.0, 14.0],
            seed,
        }
    }

    #[test]
    fn test_run_shape_and_determinism() {
        let handler = MonteCarloHandler::new(0.3);
        let a = handler.run(&request(Some(8)), None).unwrap();
        let b = handler.run(&request(Some(8)), None).unwrap();
        assert_eq!(a.scenarios.len(), 750);
        assert_eq!(a, b);
        assert!(a.scenarios.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_run_rejects_bad_lengths() {
        let handler = MonteCarloHandler::new(0.3);
        let mut bad = request(None);
        bad.uncertainty.pop();
        assert!(handler.run(&bad, None).is_err());

        let mut bad = request(None);
        bad.horizon_months = 4;
        assert!(handler.run(&bad, None).is_err());
    }

    #[test]
    fn test_progress_frames_step() {
        let handler = MonteCarloHandler::new(0.3);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = FrameSink::new("task_1".to_string(), tx);

        handler.run(&request(Some(1)), Some(&sink)).unwrap();

        let mut frames = Vec::new();
        while let Ok(WorkerMessage::Progress(frame)) = rx.try_recv() {
            frames.push(frame);
        }
        // N=250 → 步长 2 → 125 帧
        assert_eq!(frames.len(), 125);
        assert_eq!(frames.last().map(|f| f.completed), Some(250));
        assert!(frames.iter().all(|f| f.task_id.as_deref() == Some("task_1")));
        assert_eq!(frames.last().map(|f| f.progress), Some(1.0));
    }

    #[test]
    fn test_handle_rejects_malformed_payload() {
        let handler = MonteCarloHandler::new(0.3);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = FrameSink::new("task_x".to_string(), tx);
        let request = TaskRequest {
            task_id: "task_x".to_string(),
            data: serde_json::json!({"numScenarios": "many"}),
        };
        assert!(handler.handle(&request, &sink).is_err());
    }
}
