// ==========================================
// IBP 鲁棒评估引擎 - 离线任务协调器
// ==========================================
// 职责: 每个任务类型一个长驻执行通道; 按 task_id 关联请求与响应; 超时控制
// 红线: 每个 task_id 恰好解决一次（成功 / 失败 / 超时 / 通道关闭）
// ==========================================
// 机制:
// - 在途任务表由互斥锁保护，谁从表中移除任务谁负责解决它
// - 终止帧与超时竞争时，后到者找不到任务，直接忽略
// - 超时不通知执行单元停止（孤儿任务继续运行直至结束）
// ==========================================

use crate::offload::error::{OffloadError, OffloadResult};
use crate::offload::handler::{FrameSink, TaskHandler};
use crate::offload::protocol::{ProgressFrame, TaskRequest, TerminalFrame, WorkerMessage};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 离线任务进度回调
pub type TaskProgressCallback = Arc<dyn Fn(&ProgressFrame) + Send + Sync>;

/// 协调器统计
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorStats {
    pub initialized: bool,
    pub workers_active: usize,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub tasks_active: usize,
    /// 平均执行时间（毫秒，两位小数）
    pub avg_execution_ms: f64,
    pub total_execution_ms: u64,
}

struct ActiveTask {
    task_type: String,
    responder: oneshot::Sender<OffloadResult<Value>>,
    on_progress: Option<TaskProgressCallback>,
    started_at: Instant,
    // 注册序号，用于无 taskId 进度帧的路由
    seq: u64,
    timer: Option<AbortHandle>,
}

struct WorkerChannel {
    requests: std_mpsc::Sender<TaskRequest>,
    dispatcher: JoinHandle<()>,
}

#[derive(Default)]
struct StatsInner {
    tasks_completed: u64,
    tasks_failed: u64,
    total_execution_ms: u64,
}

/// 协调器共享状态（被分发任务与超时任务共同持有）
struct Shared {
    active: Mutex<HashMap<String, ActiveTask>>,
    stats: Mutex<StatsInner>,
}

impl Shared {
    fn lock_active(&self) -> MutexGuard<'_, HashMap<String, ActiveTask>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_stats(&self) -> MutexGuard<'_, StatsInner> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 处理终止帧
    fn resolve(&self, frame: TerminalFrame) {
        let task = match self.lock_active().remove(&frame.task_id) {
            Some(task) => task,
            None => {
                debug!(task_id = %frame.task_id, "终止帧对应任务已解决，忽略");
                return;
            }
        };

        if let Some(timer) = &task.timer {
            timer.abort();
        }
        let elapsed_ms = task.started_at.elapsed().as_millis() as u64;

        let outcome = {
            let mut stats = self.lock_stats();
            stats.total_execution_ms += elapsed_ms;
            if frame.success {
                stats.tasks_completed += 1;
                Ok(frame.result.unwrap_or(Value::Null))
            } else {
                stats.tasks_failed += 1;
                Err(OffloadError::WorkerExecutionError {
                    task_id: frame.task_id.clone(),
                    message: frame.error.unwrap_or_else(|| "未知错误".to_string()),
                })
            }
        };

        match &outcome {
            Ok(_) => info!(task_id = %frame.task_id, task_type = %task.task_type, elapsed_ms, "离线任务完成"),
            Err(e) => error!(task_id = %frame.task_id, task_type = %task.task_type, error = %e, "离线任务失败"),
        }
        // 调用方已放弃等待时发送失败，忽略
        let _ = task.responder.send(outcome);
    }

    /// 超时：仅当任务仍在途时拒绝
    fn expire(&self, task_id: &str, timeout: Duration) {
        let task = match self.lock_active().remove(task_id) {
            Some(task) => task,
            None => return,
        };
        let elapsed_ms = task.started_at.elapsed().as_millis() as u64;
        {
            let mut stats = self.lock_stats();
            stats.tasks_failed += 1;
            stats.total_execution_ms += elapsed_ms;
        }

        warn!(
            task_id = %task_id,
            task_type = %task.task_type,
            timeout_ms = timeout.as_millis() as u64,
            elapsed_ms,
            "离线任务超时"
        );
        let _ = task.responder.send(Err(OffloadError::TaskTimeoutError {
            task_id: task_id.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }));
    }

    /// 转发进度帧（锁外调用回调）
    fn forward_progress(&self, task_type: &str, frame: ProgressFrame) {
        let callback = {
            let active = self.lock_active();
            let target = match &frame.task_id {
                Some(id) => active.get(id),
                None => active
                    .values()
                    .filter(|t| t.task_type == task_type)
                    .min_by_key(|t| t.seq),
            };
            target.and_then(|t| t.on_progress.clone())
        };

        match callback {
            Some(cb) => {
                if catch_unwind(AssertUnwindSafe(|| cb(&frame))).is_err() {
                    warn!(task_type = %task_type, "进度回调 panic，已隔离");
                }
            }
            None => debug!(task_type = %task_type, completed = frame.completed, "进度帧无对应回调，忽略"),
        }
    }

    /// 拒绝指定通道（None 表示全部）的在途任务
    fn reject_all(&self, task_type: Option<&str>, reason: &str) -> usize {
        let drained: Vec<(String, ActiveTask)> = {
            let mut active = self.lock_active();
            let ids: Vec<String> = active
                .iter()
                .filter(|(_, t)| task_type.map_or(true, |tt| t.task_type == tt))
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| active.remove(&id).map(|t| (id, t)))
                .collect()
        };

        let count = drained.len();
        if count > 0 {
            self.lock_stats().tasks_failed += count as u64;
        }
        for (id, task) in drained {
            if let Some(timer) = &task.timer {
                timer.abort();
            }
            let _ = task
                .responder
                .send(Err(OffloadError::ChannelClosedError(format!("{} (task_id={})", reason, id))));
        }
        count
    }
}

// ==========================================
// OffloadCoordinator - 离线任务协调器
// ==========================================
pub struct OffloadCoordinator {
    channels: Mutex<HashMap<String, WorkerChannel>>,
    shared: Arc<Shared>,
    task_timeout: Duration,
    task_counter: AtomicU64,
}

impl OffloadCoordinator {
    pub fn new(task_timeout: Duration) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            shared: Arc::new(Shared {
                active: Mutex::new(HashMap::new()),
                stats: Mutex::new(StatsInner::default()),
            }),
            task_timeout,
            task_counter: AtomicU64::new(0),
        }
    }

    pub fn task_timeout(&self) -> Duration {
        self.task_timeout
    }

    /// 注册任务类型的执行通道（需在 tokio 运行时内调用）
    ///
    /// 同名通道已存在时先关闭旧通道
    pub fn register_channel(&self, handler: Arc<dyn TaskHandler>) -> OffloadResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| OffloadError::WorkerUnavailableError(format!("缺少异步运行时: {}", e)))?;

        let task_type = handler.task_type().to_string();
        let (request_tx, request_rx) = std_mpsc::channel::<TaskRequest>();
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<WorkerMessage>();

        let worker_handler = handler.clone();
        std::thread::Builder::new()
            .name(format!("offload-{}", task_type))
            .spawn(move || run_worker(worker_handler, request_rx, frame_tx))
            .map_err(|e| OffloadError::WorkerUnavailableError(format!("{}: {}", task_type, e)))?;

        let shared = self.shared.clone();
        let dispatch_type = task_type.clone();
        let dispatcher = runtime.spawn(async move {
            while let Some(message) = frame_rx.recv().await {
                match message {
                    WorkerMessage::Progress(frame) => shared.forward_progress(&dispatch_type, frame),
                    WorkerMessage::Terminal(frame) => shared.resolve(frame),
                }
            }
            let rejected = shared.reject_all(Some(&dispatch_type), "执行通道已退出");
            debug!(task_type = %dispatch_type, rejected, "分发循环结束");
        });

        let previous = self.lock_channels().insert(
            task_type.clone(),
            WorkerChannel {
                requests: request_tx,
                dispatcher,
            },
        );
        if let Some(old) = previous {
            old.dispatcher.abort();
            self.shared.reject_all(Some(&task_type), "执行通道已替换");
        }

        info!(task_type = %task_type, "离线执行通道已注册");
        Ok(())
    }

    pub fn has_channel(&self, task_type: &str) -> bool {
        self.lock_channels().contains_key(task_type)
    }

    pub fn is_initialized(&self) -> bool {
        !self.lock_channels().is_empty()
    }

    pub fn active_task_count(&self) -> usize {
        self.shared.lock_active().len()
    }

    /// 提交任务并等待终止帧或超时
    ///
    /// # 返回
    /// - Ok(Value): 终止帧中的 result
    /// - Err(WorkerUnavailableError): 通道未注册
    /// - Err(TaskTimeoutError): 超时未收到终止帧
    /// - Err(WorkerExecutionError): 执行单元报告失败
    /// - Err(ChannelClosedError): 通道在任务在途时关闭
    pub async fn execute_task(
        &self,
        task_type: &str,
        data: Value,
        on_progress: Option<TaskProgressCallback>,
    ) -> OffloadResult<Value> {
        let requests = self
            .lock_channels()
            .get(task_type)
            .map(|c| c.requests.clone())
            .ok_or_else(|| OffloadError::WorkerUnavailableError(task_type.to_string()))?;

        let (seq, task_id) = self.next_task_id();
        let (responder, receiver) = oneshot::channel();

        self.shared.lock_active().insert(
            task_id.clone(),
            ActiveTask {
                task_type: task_type.to_string(),
                responder,
                on_progress,
                started_at: Instant::now(),
                seq,
                timer: None,
            },
        );

        let request = TaskRequest {
            task_id: task_id.clone(),
            data,
        };
        if requests.send(request).is_err() {
            self.shared.lock_active().remove(&task_id);
            return Err(OffloadError::ChannelClosedError(task_type.to_string()));
        }
        debug!(task_id = %task_id, task_type = %task_type, "离线任务已提交");

        // 启动超时计时
        let shared = self.shared.clone();
        let timeout = self.task_timeout;
        let timer_id = task_id.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            shared.expire(&timer_id, timeout);
        })
        .abort_handle();

        match self.shared.lock_active().get_mut(&task_id) {
            Some(task) => task.timer = Some(timer),
            // 已在计时器登记前解决
            None => timer.abort(),
        }

        receiver
            .await
            .map_err(|_| OffloadError::ChannelClosedError(format!("响应通道已丢弃 (task_id={})", task_id)))?
    }

    /// 关闭全部通道，拒绝全部在途任务
    pub fn terminate(&self) {
        let channels: Vec<(String, WorkerChannel)> = self.lock_channels().drain().collect();
        for (task_type, channel) in &channels {
            channel.dispatcher.abort();
            debug!(task_type = %task_type, "离线执行通道已关闭");
        }
        let rejected = self.shared.reject_all(None, "协调器已终止");
        info!(channels = channels.len(), rejected, "离线协调器已终止");
    }

    pub fn stats(&self) -> CoordinatorStats {
        let workers_active = self.lock_channels().len();
        let tasks_active = self.active_task_count();
        let stats = self.shared.lock_stats();
        let avg = if stats.tasks_completed > 0 {
            stats.total_execution_ms as f64 / stats.tasks_completed as f64
        } else {
            0.0
        };

        CoordinatorStats {
            initialized: workers_active > 0,
            workers_active,
            tasks_completed: stats.tasks_completed,
            tasks_failed: stats.tasks_failed,
            tasks_active,
            avg_execution_ms: (avg * 100.0).round() / 100.0,
            total_execution_ms: stats.total_execution_ms,
        }
    }

    /// 生成 (序号, task_id)
    fn next_task_id(&self) -> (u64, String) {
        let n = self.task_counter.fetch_add(1, Ordering::Relaxed) + 1;
        (n, format!("task_{}_{}", n, Uuid::new_v4().simple()))
    }

    fn lock_channels(&self) -> MutexGuard<'_, HashMap<String, WorkerChannel>> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for OffloadCoordinator {
    fn drop(&mut self) {
        for (_, channel) in self.lock_channels().drain() {
            channel.dispatcher.abort();
        }
    }
}

/// 执行线程主循环：请求发送端全部释放后退出
fn run_worker(
    handler: Arc<dyn TaskHandler>,
    requests: std_mpsc::Receiver<TaskRequest>,
    frames: mpsc::UnboundedSender<WorkerMessage>,
) {
    while let Ok(request) = requests.recv() {
        let sink = FrameSink::new(request.task_id.clone(), frames.clone());
        let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(&request, &sink)))
            .unwrap_or_else(|_| Err("执行单元 panic".to_string()));

        let terminal = match outcome {
            Ok(result) => TerminalFrame::success(request.task_id, result),
            Err(message) => TerminalFrame::failure(request.task_id, message),
        };
        if frames.send(WorkerMessage::Terminal(terminal)).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shared() -> Shared {
        Shared {
            active: Mutex::new(HashMap::new()),
            stats: Mutex::new(StatsInner::default()),
        }
    }

    fn register(
        shared: &Shared,
        id: &str,
        seq: u64,
        on_progress: Option<TaskProgressCallback>,
    ) -> oneshot::Receiver<OffloadResult<Value>> {
        let (tx, rx) = oneshot::channel();
        shared.lock_active().insert(
            id.to_string(),
            ActiveTask {
                task_type: "monte-carlo".to_string(),
                responder: tx,
                on_progress,
                started_at: Instant::now(),
                seq,
                timer: None,
            },
        );
        rx
    }

    #[test]
    fn test_resolve_then_expire_is_noop() {
        let shared = shared();
        let mut rx = register(&shared, "t1", 1, None);

        shared.resolve(TerminalFrame::success("t1", json!({"ok": true})));
        shared.expire("t1", Duration::from_millis(10));

        let outcome = rx.try_recv().unwrap();
        assert_eq!(outcome.unwrap(), json!({"ok": true}));
        let stats = shared.lock_stats();
        assert_eq!(stats.tasks_completed, 1);
        assert_eq!(stats.tasks_failed, 0);
    }

    #[test]
    fn test_expire_then_late_terminal_is_noop() {
        let shared = shared();
        let mut rx = register(&shared, "t1", 1, None);

        shared.expire("t1", Duration::from_millis(10));
        shared.resolve(TerminalFrame::success("t1", json!(1)));

        assert!(rx.try_recv().unwrap().unwrap_err().is_timeout());
        let stats = shared.lock_stats();
        assert_eq!(stats.tasks_completed, 0);
        assert_eq!(stats.tasks_failed, 1);
    }

    #[test]
    fn test_expire_records_elapsed_time() {
        let shared = shared();
        let _rx = register(&shared, "t1", 1, None);
        std::thread::sleep(Duration::from_millis(20));

        shared.expire("t1", Duration::from_millis(10));

        let stats = shared.lock_stats();
        assert_eq!(stats.tasks_failed, 1);
        assert!(stats.total_execution_ms >= 20, "total={}", stats.total_execution_ms);
    }

    #[test]
    fn test_failure_frame_maps_to_execution_error() {
        let shared = shared();
        let mut rx = register(&shared, "t1", 1, None);
        shared.resolve(TerminalFrame::failure("t1", "数值溢出"));

        match rx.try_recv().unwrap() {
            Err(OffloadError::WorkerExecutionError { task_id, message }) => {
                assert_eq!(task_id, "t1");
                assert_eq!(message, "数值溢出");
            }
            other => panic!("应为执行失败: {:?}", other),
        }
    }

    #[test]
    fn test_untagged_progress_routes_to_oldest_task() {
        let shared = shared();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let h1 = hits.clone();
        let _rx1 = register(
            &shared,
            "older",
            1,
            Some(Arc::new(move |f: &ProgressFrame| h1.lock().unwrap().push(("older", f.completed)))),
        );
        let h2 = hits.clone();
        let _rx2 = register(
            &shared,
            "newer",
            2,
            Some(Arc::new(move |f: &ProgressFrame| h2.lock().unwrap().push(("newer", f.completed)))),
        );

        shared.forward_progress("monte-carlo", ProgressFrame::new(None, 3, 10));
        shared.forward_progress("monte-carlo", ProgressFrame::new(Some("newer".to_string()), 4, 10));
        // 其他通道的帧不会路由到本通道任务
        shared.forward_progress("other", ProgressFrame::new(None, 5, 10));

        assert_eq!(*hits.lock().unwrap(), vec![("older", 3), ("newer", 4)]);
    }

    #[test]
    fn test_reject_all_drains_tasks() {
        let shared = shared();
        let mut rx1 = register(&shared, "a", 1, None);
        let mut rx2 = register(&shared, "b", 2, None);

        assert_eq!(shared.reject_all(None, "关闭"), 2);
        assert!(matches!(rx1.try_recv().unwrap(), Err(OffloadError::ChannelClosedError(_))));
        assert!(matches!(rx2.try_recv().unwrap(), Err(OffloadError::ChannelClosedError(_))));
        assert!(shared.lock_active().is_empty());
    }
}
