// ==========================================
// IBP 鲁棒评估引擎 - 离线通道错误类型
// ==========================================
// 说明: 异步门面捕获全部离线错误并同步兜底，不向调用方抛出
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OffloadError {
    /// 任务类型未注册通道（可恢复）
    #[error("离线通道不可用: {0}")]
    WorkerUnavailableError(String),

    #[error("离线任务超时: task_id={task_id}, timeout_ms={timeout_ms}")]
    TaskTimeoutError { task_id: String, timeout_ms: u64 },

    /// 后台执行单元报告失败
    #[error("离线任务执行失败: task_id={task_id}, message={message}")]
    WorkerExecutionError { task_id: String, message: String },

    #[error("离线通道已关闭: {0}")]
    ChannelClosedError(String),

    #[error("离线消息序列化失败: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl OffloadError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, OffloadError::TaskTimeoutError { .. })
    }
}

pub type OffloadResult<T> = Result<T, OffloadError>;
