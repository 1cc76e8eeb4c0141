// ==========================================
// IBP 鲁棒评估引擎 - 模型变更事件
// ==========================================
// 职责: 事件类型定义 + 同步观察者总线
// 说明: 按事件类型维护有序订阅列表，显式订阅/退订
// 红线: 单个订阅者失败（返回错误或 panic）不影响其余订阅者
// ==========================================

use crate::domain::{DecisionVector, InventoryModel, RobustObjectiveSet, StateSnapshot, SupplyModel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// ==========================================
// 事件类型
// ==========================================

/// 模型事件类型（订阅键）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelEventKind {
    DemandUpdated,
    SupplyUpdated,
    InventoryUpdated,
    StateImported,
    ScenariosGenerated,
    ObjectivesEvaluated,
}

impl ModelEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelEventKind::DemandUpdated => "demandUpdated",
            ModelEventKind::SupplyUpdated => "supplyUpdated",
            ModelEventKind::InventoryUpdated => "inventoryUpdated",
            ModelEventKind::StateImported => "stateImported",
            ModelEventKind::ScenariosGenerated => "scenariosGenerated",
            ModelEventKind::ObjectivesEvaluated => "objectivesEvaluated",
        }
    }
}

/// 模型事件
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// 需求预测更新
    DemandUpdated { forecast: Vec<f64>, uncertainty: Vec<f64> },
    SupplyUpdated(SupplyModel),
    InventoryUpdated(InventoryModel),
    /// 状态导入完成（携带导入后的状态）
    StateImported(Box<StateSnapshot>),
    /// 情景矩阵重新生成
    ScenariosGenerated { num_scenarios: usize, horizon: usize },
    /// 完成一次目标评估
    ObjectivesEvaluated {
        decision: DecisionVector,
        objectives: RobustObjectiveSet,
    },
}

impl ModelEvent {
    pub fn kind(&self) -> ModelEventKind {
        match self {
            ModelEvent::DemandUpdated { .. } => ModelEventKind::DemandUpdated,
            ModelEvent::SupplyUpdated(_) => ModelEventKind::SupplyUpdated,
            ModelEvent::InventoryUpdated(_) => ModelEventKind::InventoryUpdated,
            ModelEvent::StateImported(_) => ModelEventKind::StateImported,
            ModelEvent::ScenariosGenerated { .. } => ModelEventKind::ScenariosGenerated,
            ModelEvent::ObjectivesEvaluated { .. } => ModelEventKind::ObjectivesEvaluated,
        }
    }
}

// ==========================================
// 事件监听 Trait
// ==========================================

/// 模型事件监听者
///
/// 由展示层等外部协作方实现；闭包可直接作为监听者使用
pub trait ModelEventListener: Send + Sync {
    fn on_event(&self, event: &ModelEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

impl<F> ModelEventListener for F
where
    F: Fn(&ModelEvent) -> Result<(), Box<dyn Error + Send + Sync>> + Send + Sync,
{
    fn on_event(&self, event: &ModelEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        self(event)
    }
}

/// 订阅句柄（退订时使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscribers = Vec<(SubscriptionId, Arc<dyn ModelEventListener>)>;

// ==========================================
// EventBus - 同步事件总线
// ==========================================
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<HashMap<ModelEventKind, Subscribers>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅事件，按订阅顺序通知
    pub fn subscribe(&self, kind: ModelEventKind, listener: Arc<dyn ModelEventListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.entry(kind).or_default().push((id, listener));
        id
    }

    /// 退订，返回是否找到该订阅
    pub fn unsubscribe(&self, kind: ModelEventKind, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        match subscribers.get_mut(&kind) {
            Some(list) => {
                let before = list.len();
                list.retain(|(sid, _)| *sid != id);
                list.len() != before
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self, kind: ModelEventKind) -> usize {
        let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// 同步广播事件
    ///
    /// 在锁外依次调用订阅者；返回成功通知的订阅者数
    pub fn emit(&self, event: &ModelEvent) -> usize {
        let kind = event.kind();
        let listeners: Subscribers = {
            let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
            subscribers.get(&kind).cloned().unwrap_or_default()
        };

        let mut delivered = 0;
        for (id, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(event = kind.as_str(), subscription = id.0, error = %e, "事件订阅者处理失败");
                }
                Err(_) => {
                    tracing::error!(event = kind.as_str(), subscription = id.0, "事件订阅者 panic，已隔离");
                }
            }
        }
        delivered
    }
}
