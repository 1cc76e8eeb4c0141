// ==========================================
// IBP 鲁棒评估引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 同步路径上的配置错误立即返回，不重试
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 数组长度与规划期不一致
    #[error("配置错误: field={field}, expected_len={expected}, actual_len={actual}")]
    ConfigurationError {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// 聚合零个情景
    #[error("情景集为空: objective={0}")]
    EmptyScenarioSetError(String),

    /// 规划配置非法
    #[error("规划配置非法: {0}")]
    InvalidConfigError(String),

    #[error("模型状态异常: {0}")]
    InvalidStateError(String),
}

impl EngineError {
    pub fn length_mismatch(field: impl Into<String>, expected: usize, actual: usize) -> Self {
        EngineError::ConfigurationError {
            field: field.into(),
            expected,
            actual,
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
