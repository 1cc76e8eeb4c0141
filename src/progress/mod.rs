// ==========================================
// IBP 鲁棒评估引擎 - 进度层
// ==========================================

pub mod progress_manager;

pub use progress_manager::{ProgressManager, ProgressObserver, ProgressSnapshot, ProgressTracker, DEFAULT_TOTAL};
