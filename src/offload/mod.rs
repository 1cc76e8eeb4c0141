// ==========================================
// IBP 鲁棒评估引擎 - 离线执行层
// ==========================================
// 职责: 把昂贵的情景采样委托给后台执行通道
// ==========================================

pub mod coordinator;
pub mod error;
pub mod handler;
pub mod monte_carlo;
pub mod protocol;

pub use coordinator::{CoordinatorStats, OffloadCoordinator, TaskProgressCallback};
pub use error::{OffloadError, OffloadResult};
pub use handler::{FrameSink, TaskHandler};
pub use monte_carlo::{MonteCarloHandler, MONTE_CARLO_TASK};
pub use protocol::{
    FrameType, MonteCarloRequest, MonteCarloResult, ProgressFrame, TaskRequest, TerminalFrame, WorkerMessage,
};
