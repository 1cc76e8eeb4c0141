// ==========================================
// IBP 鲁棒评估引擎 - 日志初始化
// ==========================================
// 输出: 控制台文本（默认）或 JSON 行（IBP_LOG_JSON）
// 目标: ibp_optimization::* 为业务日志, perf 为耗时日志
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的过滤规则（耗时日志只保留告警）
pub const DEFAULT_FILTER: &str = "info,perf=warn";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 覆盖 [`DEFAULT_FILTER`]
///   例如: RUST_LOG=debug 或 RUST_LOG=ibp_optimization::offload=trace,perf=info
/// - IBP_LOG_JSON: 设为 1/true 时输出 JSON 格式日志
///
/// # 示例
/// ```no_run
/// use ibp_optimization::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_line_number(true);

    // 重复初始化时忽略
    let _ = if json_output_enabled() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn json_output_enabled() -> bool {
    std::env::var("IBP_LOG_JSON")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// 测试用日志（debug 级别，输出交给测试框架捕获）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
