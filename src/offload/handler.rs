// ==========================================
// IBP 鲁棒评估引擎 - 后台任务处理器
// ==========================================
// 职责: 定义后台执行单元 trait，与协调器仅通过消息交互
// 说明: 每个任务类型一个长驻执行线程，按请求顺序串行处理
// ==========================================

use crate::offload::protocol::{ProgressFrame, TaskRequest, WorkerMessage};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

/// 进度帧发送端（绑定单个任务）
#[derive(Debug, Clone)]
pub struct FrameSink {
    task_id: String,
    frames: UnboundedSender<WorkerMessage>,
}

impl FrameSink {
    pub(crate) fn new(task_id: String, frames: UnboundedSender<WorkerMessage>) -> Self {
        Self { task_id, frames }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// 发送进度帧；通道已关闭时静默丢弃
    pub fn progress(&self, completed: usize, total: usize) {
        let frame = ProgressFrame::new(Some(self.task_id.clone()), completed, total);
        let _ = self.frames.send(WorkerMessage::Progress(frame));
    }
}

/// 后台任务处理器
///
/// `handle` 在执行线程上同步运行；返回 Err 时协调器以失败终止帧结束任务
pub trait TaskHandler: Send + Sync + 'static {
    /// 任务类型（通道名）
    fn task_type(&self) -> &str;

    fn handle(&self, request: &TaskRequest, sink: &FrameSink) -> Result<Value, String>;
}
