// ==========================================
// IBP 鲁棒评估引擎 - API层错误类型
// ==========================================
// 职责: 汇总引擎层/离线层错误，转换为调用方可读的错误消息
// 说明: 异步评估路径不返回离线错误（已同步兜底），此处转换供显式离线调用使用
// ==========================================

use crate::engine::EngineError;
use crate::offload::OffloadError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入/配置错误（同步路径立即返回，不重试）
    // ==========================================
    #[error("数组长度不匹配: field={field}, expected_len={expected}, actual_len={actual}")]
    ConfigurationError {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("情景集为空: {0}")]
    EmptyScenarioSet(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("无效配置: {0}")]
    InvalidConfig(String),

    // ==========================================
    // 离线执行错误
    // ==========================================
    #[error("离线通道不可用: {0}")]
    WorkerUnavailable(String),

    #[error("离线任务超时: task_id={task_id}, timeout_ms={timeout_ms}")]
    TaskTimeout { task_id: String, timeout_ms: u64 },

    #[error("离线任务失败: {0}")]
    WorkerExecution(String),

    // ==========================================
    // 外部协作方错误
    // ==========================================
    #[error("数据源错误: {0}")]
    DataSourceError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ConfigurationError {
                field,
                expected,
                actual,
            } => ApiError::ConfigurationError {
                field,
                expected,
                actual,
            },
            EngineError::EmptyScenarioSetError(objective) => ApiError::EmptyScenarioSet(objective),
            EngineError::InvalidConfigError(msg) => ApiError::InvalidConfig(msg),
            EngineError::InvalidStateError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 OffloadError 转换
// ==========================================
impl From<OffloadError> for ApiError {
    fn from(err: OffloadError) -> Self {
        match err {
            OffloadError::WorkerUnavailableError(task_type) => ApiError::WorkerUnavailable(task_type),
            OffloadError::TaskTimeoutError { task_id, timeout_ms } => ApiError::TaskTimeout { task_id, timeout_ms },
            OffloadError::WorkerExecutionError { task_id, message } => {
                ApiError::WorkerExecution(format!("task_id={}, {}", task_id, message))
            }
            OffloadError::ChannelClosedError(msg) => ApiError::WorkerUnavailable(msg),
            OffloadError::SerializationError(e) => ApiError::InternalError(format!("离线消息序列化失败: {}", e)),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
