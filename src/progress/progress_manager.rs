// ==========================================
// IBP 鲁棒评估引擎 - 进度跟踪
// ==========================================
// 职责: 进度/速率/ETA 计算 + 按跟踪器 id 的观察者分发
// 红线:
// - current 恒在 [0, total] 内
// - is_complete 只由 false 变为 true 一次 (just_completed 仅出现一次)
// - 单个观察者失败不影响其余观察者
// ==========================================
// 说明: 跟踪器状态只经由 ProgressManager 修改，观察者在锁外调用
// ==========================================

use serde::Serialize;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::warn;

/// 默认总量
pub const DEFAULT_TOTAL: u64 = 100;

/// 进度观察者
pub type ProgressObserver = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

/// 一次进度更新的快照
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub id: String,
    pub current: u64,
    pub total: u64,
    /// 百分比（两位小数）
    pub percentage: f64,
    pub elapsed_ms: u64,
    /// 每秒完成量（两位小数）
    pub rate: f64,
    /// 预计剩余时间（毫秒）
    pub eta_ms: u64,
    pub message: String,
    pub is_complete: bool,
    /// 本次更新恰好完成
    pub just_completed: bool,
}

// ==========================================
// ProgressTracker - 单个进度跟踪器
// ==========================================
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    id: String,
    current: u64,
    total: u64,
    started_at: Instant,
    is_complete: bool,
    message: String,
}

impl ProgressTracker {
    pub fn new(id: impl Into<String>, total: u64) -> Self {
        Self {
            id: id.into(),
            current: 0,
            total,
            started_at: Instant::now(),
            is_complete: false,
            message: String::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn increment(&mut self, amount: u64) -> ProgressSnapshot {
        self.current = self.current.saturating_add(amount).min(self.total);
        self.update()
    }

    pub fn set_progress(&mut self, current: u64) -> ProgressSnapshot {
        self.current = current.min(self.total);
        self.update()
    }

    /// 修改总量；已完成的跟踪器不会回退为未完成
    pub fn set_total(&mut self, total: u64) -> ProgressSnapshot {
        self.total = total;
        self.current = self.current.min(total);
        self.update()
    }

    pub fn set_message(&mut self, message: impl Into<String>) -> ProgressSnapshot {
        self.message = message.into();
        self.update()
    }

    /// 强制完成
    pub fn complete(&mut self) -> ProgressSnapshot {
        self.current = self.total;
        self.update()
    }

    /// 重新计算进度，必要时完成状态迁移
    fn update(&mut self) -> ProgressSnapshot {
        let elapsed = self.started_at.elapsed();
        let elapsed_secs = elapsed.as_secs_f64();

        let percentage = if self.total > 0 {
            self.current as f64 / self.total as f64 * 100.0
        } else {
            100.0
        };
        let rate = if elapsed_secs > 0.0 {
            self.current as f64 / elapsed_secs
        } else {
            0.0
        };
        let eta_ms = if self.current > 0 && rate > 0.0 {
            ((self.total - self.current) as f64 / rate * 1000.0).round() as u64
        } else {
            0
        };

        let reached = self.current >= self.total;
        let just_completed = reached && !self.is_complete;
        if just_completed {
            self.is_complete = true;
        }

        ProgressSnapshot {
            id: self.id.clone(),
            current: self.current,
            total: self.total,
            percentage: round2(percentage),
            elapsed_ms: elapsed.as_millis() as u64,
            rate: round2(rate),
            eta_ms,
            message: self.message.clone(),
            is_complete: self.is_complete,
            just_completed,
        }
    }
}

// ==========================================
// ProgressManager - 进度管理器
// ==========================================
#[derive(Default)]
pub struct ProgressManager {
    trackers: Mutex<HashMap<String, ProgressTracker>>,
    observers: Mutex<HashMap<String, Vec<ProgressObserver>>>,
}

impl ProgressManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建（或替换）跟踪器
    pub fn create_tracker(&self, id: impl Into<String>, total: u64) -> ProgressSnapshot {
        let id = id.into();
        let mut tracker = ProgressTracker::new(id.clone(), total);
        let snapshot = tracker.update();
        self.lock_trackers().insert(id, tracker);
        snapshot
    }

    pub fn has_tracker(&self, id: &str) -> bool {
        self.lock_trackers().contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.lock_trackers().len()
    }

    /// 注册观察者（跟踪器可尚未创建）
    pub fn on_progress(&self, id: impl Into<String>, observer: ProgressObserver) {
        self.lock_observers().entry(id.into()).or_default().push(observer);
    }

    pub fn increment(&self, id: &str, amount: u64) -> Option<ProgressSnapshot> {
        self.apply(id, |t| t.increment(amount))
    }

    pub fn set_progress(&self, id: &str, current: u64) -> Option<ProgressSnapshot> {
        self.apply(id, |t| t.set_progress(current))
    }

    pub fn set_total(&self, id: &str, total: u64) -> Option<ProgressSnapshot> {
        self.apply(id, |t| t.set_total(total))
    }

    pub fn set_message(&self, id: &str, message: &str) -> Option<ProgressSnapshot> {
        self.apply(id, |t| t.set_message(message))
    }

    pub fn complete(&self, id: &str) -> Option<ProgressSnapshot> {
        self.apply(id, |t| t.complete())
    }

    /// 完成并移除跟踪器及其观察者
    pub fn remove_tracker(&self, id: &str) -> Option<ProgressSnapshot> {
        let snapshot = self.complete(id);
        self.lock_trackers().remove(id);
        self.lock_observers().remove(id);
        snapshot
    }

    /// 修改跟踪器后在锁外通知观察者
    fn apply<F>(&self, id: &str, op: F) -> Option<ProgressSnapshot>
    where
        F: FnOnce(&mut ProgressTracker) -> ProgressSnapshot,
    {
        let snapshot = {
            let mut trackers = self.lock_trackers();
            let tracker = trackers.get_mut(id)?;
            op(tracker)
        };
        self.notify(&snapshot);
        Some(snapshot)
    }

    fn notify(&self, snapshot: &ProgressSnapshot) {
        let observers: Vec<ProgressObserver> = self
            .lock_observers()
            .get(&snapshot.id)
            .cloned()
            .unwrap_or_default();

        for observer in observers {
            if catch_unwind(AssertUnwindSafe(|| observer(snapshot))).is_err() {
                warn!(tracker = %snapshot.id, "进度观察者 panic，已隔离");
            }
        }
    }

    fn lock_trackers(&self) -> MutexGuard<'_, HashMap<String, ProgressTracker>> {
        self.trackers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_observers(&self) -> MutexGuard<'_, HashMap<String, Vec<ProgressObserver>>> {
        self.observers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
