// ==========================================
// IBP 鲁棒评估引擎 - 性能监控
// ==========================================
// 职责: 按操作名累计耗时统计 + RAII 计时 Guard
// ==========================================

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// 单个操作的耗时统计（毫秒）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStats {
    pub count: u64,
    pub total_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
}

impl OperationStats {
    fn empty() -> Self {
        Self {
            count: 0,
            total_ms: 0.0,
            min_ms: f64::INFINITY,
            max_ms: 0.0,
            avg_ms: 0.0,
        }
    }

    fn record(&mut self, ms: f64) {
        self.count += 1;
        self.total_ms += ms;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);
        self.avg_ms = self.total_ms / self.count as f64;
    }

    fn rounded(&self) -> Self {
        Self {
            count: self.count,
            total_ms: round2(self.total_ms),
            min_ms: round2(self.min_ms),
            max_ms: round2(self.max_ms),
            avg_ms: round2(self.avg_ms),
        }
    }
}

#[derive(Default)]
struct MonitorInner {
    metrics: BTreeMap<String, OperationStats>,
    started: HashMap<String, Instant>,
}

// ==========================================
// PerformanceMonitor - 性能监控器
// ==========================================
#[derive(Default)]
pub struct PerformanceMonitor {
    inner: Mutex<MonitorInner>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_timer(&self, op: &str) {
        self.lock().started.insert(op.to_string(), Instant::now());
    }

    /// 结束计时并记录，返回耗时（毫秒）；未开始计时返回 0
    pub fn end_timer(&self, op: &str) -> f64 {
        let mut inner = self.lock();
        match inner.started.remove(op) {
            Some(start) => {
                let ms = start.elapsed().as_secs_f64() * 1000.0;
                inner.metrics.entry(op.to_string()).or_insert_with(OperationStats::empty).record(ms);
                ms
            }
            None => 0.0,
        }
    }

    pub fn record(&self, op: &str, ms: f64) {
        self.lock()
            .metrics
            .entry(op.to_string())
            .or_insert_with(OperationStats::empty)
            .record(ms);
    }

    /// 各操作统计（两位小数）
    pub fn stats(&self) -> BTreeMap<String, OperationStats> {
        self.lock()
            .metrics
            .iter()
            .map(|(op, s)| (op.clone(), s.rounded()))
            .collect()
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.metrics.clear();
        inner.started.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MonitorInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 性能统计 Guard：析构时输出 elapsed_ms，并记入监控器（如有）
///
/// 使用方式：
/// ```ignore
/// let _perf = ibp_optimization::perf::PerfGuard::new("evaluate");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    monitor: Option<Arc<PerformanceMonitor>>,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            start: Instant::now(),
            monitor: None,
        }
    }

    pub fn with_monitor(op: &'static str, monitor: Arc<PerformanceMonitor>) -> Self {
        Self {
            op,
            start: Instant::now(),
            monitor: Some(monitor),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;

        if let Some(monitor) = &self.monitor {
            monitor.record(self.op, elapsed.as_secs_f64() * 1000.0);
        }

        tracing::info!(target: "perf", op = self.op, elapsed_ms, "done");
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
