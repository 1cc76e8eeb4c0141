// ==========================================
// IBP 鲁棒评估引擎 - 离线通道消息协议
// ==========================================
// 请求:   {taskId, data}
// 进度帧: {type: "progress", progress, completed, total, taskId?}
// 终止帧: {taskId, success, result | error}
// ==========================================
// 说明: 进度帧的 taskId 可缺省，缺省时按通道内最早的在途任务路由
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 任务请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub task_id: String,
    pub data: Value,
}

/// 蒙特卡洛采样请求负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloRequest {
    pub num_scenarios: usize,
    pub horizon_months: usize,
    pub forecast: Vec<f64>,
    pub uncertainty: Vec<f64>,
    /// 随机种子（缺省时使用系统熵）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// 蒙特卡洛采样结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResult {
    pub scenarios: Vec<f64>,
    pub num_scenarios: usize,
    pub horizon_months: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    Progress,
}

/// 进度帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressFrame {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    /// [0, 1]
    pub progress: f64,
    pub completed: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl ProgressFrame {
    pub fn new(task_id: Option<String>, completed: usize, total: usize) -> Self {
        let progress = if total > 0 {
            (completed as f64 / total as f64).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            frame_type: FrameType::Progress,
            progress,
            completed,
            total,
            task_id,
        }
    }
}

/// 终止帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalFrame {
    pub task_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TerminalFrame {
    pub fn success(task_id: impl Into<String>, result: Value) -> Self {
        Self {
            task_id: task_id.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// 后台执行单元发出的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerMessage {
    Progress(ProgressFrame),
    Terminal(TerminalFrame),
}
