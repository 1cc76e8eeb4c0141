// ==========================================
// IBP 鲁棒评估引擎 - 加速评估门面
// ==========================================
// 职责: 在基础模型外叠加 缓存 / 离线采样 / 进度跟踪 / 性能统计
// 输入: PlanningModel + CacheManager + OffloadCoordinator (可选)
// 输出: ScenarioBundle / ObjectiveEvaluation (标注生成方式)
// 红线: 离线失败不向调用方抛出，统一回退同步路径
// ==========================================
// 说明: 模型锁不跨越 await；同步回调在模型锁内触发，观察者不得回调门面
// ==========================================

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::data_source::PlanningDataSource;
use crate::api::error::{ApiError, ApiResult};
use crate::cache::{create_key, CacheManager, CacheStats, CachedValue};
use crate::config::{ConfigManager, EvaluationSettings, PlanningConfig};
use crate::domain::{
    DecisionVector, GenerationMethod, InventoryModel, ObjectiveEvaluation, ObjectiveKind, RobustObjectiveSet,
    ScenarioBundle, StateSnapshot, SupplyModel, ValidationReport,
};
use crate::engine::{
    EngineError, EngineResult, ModelEventKind, ModelEventListener, PlanEvaluator, PlanningModel, SubscriptionId,
};
use crate::offload::{
    CoordinatorStats, MonteCarloHandler, MonteCarloRequest, MonteCarloResult, OffloadCoordinator, ProgressFrame,
    TaskProgressCallback, MONTE_CARLO_TASK,
};
use crate::perf::{OperationStats, PerfGuard, PerformanceMonitor};
use crate::progress::{ProgressManager, ProgressObserver};

// ==========================================
// 性能报告
// ==========================================

/// 已启用的加速能力
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub caching: bool,
    pub offload: bool,
    pub progress_tracking: bool,
    pub performance_monitoring: bool,
}

/// 模型概况
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub horizon_months: usize,
    pub num_scenarios: usize,
    pub objectives: Vec<ObjectiveKind>,
    pub revision: u64,
    pub has_objectives: bool,
}

/// 门面性能报告
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub cache: CacheStats,
    pub performance: BTreeMap<String, OperationStats>,
    pub coordinator: Option<CoordinatorStats>,
    pub features: FeatureFlags,
    pub model: ModelSummary,
}

// ==========================================
// PlanningApi - 加速评估门面
// ==========================================

/// 加速评估门面
///
/// 职责：
/// 1. 异步情景生成（缓存 → 离线通道 → 同步兜底）
/// 2. 异步目标评估（缓存 → 同步逐目标评估）
/// 3. 透传基础模型的同步操作
/// 4. 性能统计与资源清理
pub struct PlanningApi {
    model: Mutex<PlanningModel>,
    cache: Arc<CacheManager<CachedValue>>,
    coordinator: Option<Arc<OffloadCoordinator>>,
    progress: Arc<ProgressManager>,
    monitor: Arc<PerformanceMonitor>,
}

impl PlanningApi {
    /// 创建门面（依赖注入）
    pub fn new(
        model: PlanningModel,
        cache: Arc<CacheManager<CachedValue>>,
        coordinator: Option<Arc<OffloadCoordinator>>,
        progress: Arc<ProgressManager>,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        Self {
            model: Mutex::new(model),
            cache,
            coordinator,
            progress,
            monitor,
        }
    }

    /// 按规划配置与运行参数装配全部组件
    pub fn from_settings(config: PlanningConfig, settings: EvaluationSettings) -> ApiResult<Self> {
        let cache = Arc::new(CacheManager::new(settings.cache_max_size, settings.cache_ttl));
        let coordinator = Arc::new(OffloadCoordinator::new(settings.task_timeout));
        let model = PlanningModel::new(config, settings)?;

        Ok(Self::new(
            model,
            cache,
            Some(coordinator),
            Arc::new(ProgressManager::new()),
            Arc::new(PerformanceMonitor::new()),
        ))
    }

    /// 从配置管理器装配
    pub fn from_config_manager(config_manager: &ConfigManager) -> ApiResult<Self> {
        Self::from_settings(
            config_manager.get_planning_config(),
            config_manager.evaluation_settings(),
        )
    }

    /// 注册蒙特卡洛离线通道
    ///
    /// # 返回
    /// - true: 离线通道可用
    /// - false: 未配置协调器或注册失败，后续采样走同步路径
    pub async fn initialize(&self) -> bool {
        let Some(coordinator) = &self.coordinator else {
            info!("未配置离线协调器，使用同步路径");
            return false;
        };
        if coordinator.has_channel(MONTE_CARLO_TASK) {
            return true;
        }

        let correlation = self.lock_model().settings().serial_correlation;
        match coordinator.register_channel(Arc::new(MonteCarloHandler::new(correlation))) {
            Ok(()) => {
                info!(task_type = MONTE_CARLO_TASK, "离线采样通道已就绪");
                true
            }
            Err(e) => {
                warn!(error = %e, "离线通道注册失败，使用同步路径");
                false
            }
        }
    }

    // ==========================================
    // 组件访问
    // ==========================================

    pub fn cache(&self) -> Arc<CacheManager<CachedValue>> {
        self.cache.clone()
    }

    pub fn progress(&self) -> Arc<ProgressManager> {
        self.progress.clone()
    }

    pub fn monitor(&self) -> Arc<PerformanceMonitor> {
        self.monitor.clone()
    }

    pub fn coordinator(&self) -> Option<Arc<OffloadCoordinator>> {
        self.coordinator.clone()
    }

    /// 只读访问基础模型
    pub fn with_model<T>(&self, f: impl FnOnce(&PlanningModel) -> T) -> T {
        f(&self.lock_model())
    }

    fn lock_model(&self) -> MutexGuard<'_, PlanningModel> {
        self.model.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn model_mut(&mut self) -> &mut PlanningModel {
        self.model.get_mut().unwrap_or_else(|e| e.into_inner())
    }

    // ==========================================
    // 异步情景生成
    // ==========================================

    /// 生成需求情景
    ///
    /// 顺序: 缓存命中 → 离线通道 → 同步兜底
    ///
    /// 离线采样期间若预测被更新，返回的是发起时输入对应的情景，
    /// 模型保留更新后重新生成的情景
    ///
    /// # 返回
    /// - Ok(ScenarioBundle): 情景矩阵，metadata.method 标注来源
    /// - Err(ApiError): 仅同步路径本身失败时返回
    pub async fn sample_async(&self, on_progress: Option<ProgressObserver>) -> ApiResult<ScenarioBundle> {
        let _perf = PerfGuard::with_monitor("sample_async", self.monitor.clone());

        let (key, num_scenarios) = {
            let model = self.lock_model();
            (scenario_cache_key(&model), model.num_scenarios())
        };

        if let Some(CachedValue::Scenarios(bundle)) = self.cache.get(&key) {
            self.lock_model().install_scenarios(bundle.scenarios.clone())?;
            debug!(num_scenarios, "情景缓存命中");
            return Ok(bundle.with_method(GenerationMethod::Cached));
        }

        let tracker_id = format!("scenarios_{}", Uuid::new_v4().simple());
        self.progress.create_tracker(tracker_id.clone(), num_scenarios as u64);
        if let Some(observer) = on_progress {
            self.progress.on_progress(tracker_id.clone(), observer);
        }

        let outcome = self.generate_scenarios(&tracker_id).await;
        self.progress.remove_tracker(&tracker_id);
        let (key, bundle) = outcome?;

        self.cache.set(key, CachedValue::Scenarios(bundle.clone()));
        info!(
            num_scenarios = bundle.num_scenarios,
            horizon = bundle.horizon_months,
            method = %bundle.metadata.method,
            "情景生成完成"
        );
        Ok(bundle)
    }

    /// 返回 (生成时输入对应的缓存键, 情景)
    async fn generate_scenarios(&self, tracker_id: &str) -> ApiResult<(String, ScenarioBundle)> {
        let offload = self
            .coordinator
            .as_ref()
            .filter(|c| c.has_channel(MONTE_CARLO_TASK));

        let generated = match offload {
            Some(coordinator) => match self.sample_offloaded(coordinator, tracker_id).await {
                Ok(generated) => generated,
                Err(e) => {
                    warn!(error = %e, "离线采样失败，回退同步采样");
                    self.sample_with_tracker(tracker_id, GenerationMethod::Fallback)?
                }
            },
            None => self.sample_with_tracker(tracker_id, GenerationMethod::Synchronous)?,
        };

        self.progress.complete(tracker_id);
        Ok(generated)
    }

    /// 离线通道采样
    ///
    /// 等待期间需求输入被更新时，结果只返回给调用方，不写回模型
    async fn sample_offloaded(
        &self,
        coordinator: &OffloadCoordinator,
        tracker_id: &str,
    ) -> ApiResult<(String, ScenarioBundle)> {
        let (key, request) = {
            let mut model = self.lock_model();
            let request = MonteCarloRequest {
                num_scenarios: model.num_scenarios(),
                horizon_months: model.horizon(),
                forecast: model.demand().forecast.clone(),
                uncertainty: model.demand().uncertainty.clone(),
                seed: model.next_offload_seed(),
            };
            (scenario_cache_key(&model), request)
        };
        let data = serde_json::to_value(&request).map_err(|e| ApiError::InternalError(e.to_string()))?;

        let progress = self.progress.clone();
        let id = tracker_id.to_string();
        let callback: TaskProgressCallback = Arc::new(move |frame: &ProgressFrame| {
            progress.set_progress(&id, frame.completed as u64);
        });

        let value = coordinator.execute_task(MONTE_CARLO_TASK, data, Some(callback)).await?;
        let result: MonteCarloResult = serde_json::from_value(value)
            .map_err(|e| ApiError::WorkerExecution(format!("采样结果解析失败: {}", e)))?;

        let expected = request.num_scenarios * request.horizon_months;
        if result.scenarios.len() != expected {
            return Err(EngineError::length_mismatch("demand.scenarios", expected, result.scenarios.len()).into());
        }

        let bundle = ScenarioBundle::new(
            result.scenarios,
            request.num_scenarios,
            request.horizon_months,
            GenerationMethod::Offloaded,
        );

        let mut model = self.lock_model();
        if scenario_cache_key(&model) == key {
            model.install_scenarios(bundle.scenarios.clone())?;
        } else {
            warn!(revision = model.revision(), "采样期间需求输入已更新，离线结果不写回模型");
        }
        Ok((key, bundle))
    }

    /// 同步采样，按约 1% 步长推进进度
    fn sample_with_tracker(
        &self,
        tracker_id: &str,
        method: GenerationMethod,
    ) -> ApiResult<(String, ScenarioBundle)> {
        let mut model = self.lock_model();
        let step = (model.num_scenarios() / 100).max(1);
        let progress = &self.progress;
        model.sample_with_progress(|done, total| {
            if done % step == 0 || done == total {
                progress.set_progress(tracker_id, done as u64);
            }
        })?;

        let bundle = ScenarioBundle::new(
            model.demand().scenarios.clone(),
            model.num_scenarios(),
            model.horizon(),
            method,
        );
        Ok((scenario_cache_key(&model), bundle))
    }

    // ==========================================
    // 异步目标评估
    // ==========================================

    /// 评估候选计划（None 表示当前决策）
    ///
    /// # 返回
    /// - Ok(ObjectiveEvaluation): method 为 Cached 或 Synchronous
    /// - Err(ConfigurationError): 决策向量长度不符
    pub async fn evaluate_async(
        &self,
        decision: Option<DecisionVector>,
        on_progress: Option<ProgressObserver>,
    ) -> ApiResult<ObjectiveEvaluation> {
        let _perf = PerfGuard::with_monitor("evaluate_async", self.monitor.clone());

        let (key, num_objectives) = {
            let model = self.lock_model();
            let effective = decision.as_ref().unwrap_or_else(|| model.decisions());
            (evaluation_cache_key(&model, effective)?, model.config().objectives.len())
        };

        if let Some(CachedValue::Objectives(objectives)) = self.cache.get(&key) {
            self.lock_model().restore_evaluation(decision.as_ref(), objectives.clone())?;
            debug!("评估缓存命中");
            return Ok(ObjectiveEvaluation::new(objectives, GenerationMethod::Cached));
        }

        let tracker_id = format!("objectives_{}", Uuid::new_v4().simple());
        self.progress.create_tracker(tracker_id.clone(), num_objectives as u64);
        if let Some(observer) = on_progress {
            self.progress.on_progress(tracker_id.clone(), observer);
        }

        let outcome = {
            let mut model = self.lock_model();
            let progress = &self.progress;
            model.evaluate_with_progress(decision.as_ref(), |_, done, _| {
                progress.set_progress(&tracker_id, done as u64);
            })
        };
        self.progress.remove_tracker(&tracker_id);
        let objectives = outcome?;

        self.cache.set(key, CachedValue::Objectives(objectives.clone()));
        Ok(ObjectiveEvaluation::new(objectives, GenerationMethod::Synchronous))
    }

    // ==========================================
    // 同步透传
    // ==========================================

    pub fn sample(&self) -> ApiResult<()> {
        Ok(self.lock_model().sample()?)
    }

    pub fn random_plan(&self) -> DecisionVector {
        self.lock_model().random_plan()
    }

    pub fn evaluate(&self, decision: Option<&DecisionVector>) -> ApiResult<RobustObjectiveSet> {
        Ok(self.lock_model().evaluate(decision)?)
    }

    pub fn validate(&self, decision: &DecisionVector) -> ApiResult<ValidationReport> {
        Ok(self.lock_model().validate(decision)?)
    }

    pub fn export_state(&self) -> StateSnapshot {
        self.lock_model().export_state()
    }

    pub fn import_state(&self, snapshot: StateSnapshot) -> ApiResult<()> {
        Ok(self.lock_model().import_state(snapshot)?)
    }

    pub fn update_demand_forecast(&self, forecast: Vec<f64>, uncertainty: Option<Vec<f64>>) -> ApiResult<()> {
        Ok(self.lock_model().update_demand_forecast(forecast, uncertainty)?)
    }

    pub fn update_supply(&self, supply: SupplyModel) -> ApiResult<()> {
        Ok(self.lock_model().update_supply(supply)?)
    }

    pub fn update_inventory(&self, inventory: InventoryModel) -> ApiResult<()> {
        Ok(self.lock_model().update_inventory(inventory)?)
    }

    pub fn subscribe(&self, kind: ModelEventKind, listener: Arc<dyn ModelEventListener>) -> SubscriptionId {
        self.lock_model().subscribe(kind, listener)
    }

    pub fn unsubscribe(&self, kind: ModelEventKind, id: SubscriptionId) -> bool {
        self.lock_model().unsubscribe(kind, id)
    }

    // ==========================================
    // 外部数据加载
    // ==========================================

    /// 从数据源加载需求/供应/库存（整体校验后再写入）
    pub async fn load_from(&self, source: &dyn PlanningDataSource) -> ApiResult<()> {
        let dataset = source
            .load()
            .await
            .map_err(|e| ApiError::DataSourceError(format!("{}: {}", source.name(), e)))?;

        let mut model = self.lock_model();
        let horizon = model.horizon();
        for (field, len) in [
            ("demand.forecast", dataset.forecast.as_ref().map(Vec::len)),
            ("demand.uncertainty", dataset.uncertainty.as_ref().map(Vec::len)),
        ] {
            if let Some(actual) = len.filter(|l| *l != horizon) {
                return Err(EngineError::length_mismatch(field, horizon, actual).into());
            }
        }
        let bad_part = dataset
            .supply
            .as_ref()
            .and_then(|s| s.mismatched_field(horizon))
            .or_else(|| dataset.inventory.as_ref().and_then(|i| i.mismatched_field(horizon)));
        if let Some((field, actual)) = bad_part {
            return Err(EngineError::length_mismatch(field, horizon, actual).into());
        }

        if let Some(supply) = dataset.supply {
            model.update_supply(supply)?;
        }
        if let Some(inventory) = dataset.inventory {
            model.update_inventory(inventory)?;
        }
        match (dataset.forecast, dataset.uncertainty) {
            (Some(forecast), uncertainty) => model.update_demand_forecast(forecast, uncertainty)?,
            (None, Some(uncertainty)) => {
                let forecast = model.demand().forecast.clone();
                model.update_demand_forecast(forecast, Some(uncertainty))?;
            }
            (None, None) => {}
        }

        info!(source = source.name(), revision = model.revision(), "规划数据已加载");
        Ok(())
    }

    // ==========================================
    // 统计与清理
    // ==========================================

    pub fn performance_stats(&self) -> PerformanceReport {
        let model = {
            let model = self.lock_model();
            ModelSummary {
                horizon_months: model.horizon(),
                num_scenarios: model.num_scenarios(),
                objectives: model.config().objectives.clone(),
                revision: model.revision(),
                has_objectives: model.last_objectives().is_some(),
            }
        };
        let cache = self.cache.stats();

        PerformanceReport {
            features: FeatureFlags {
                caching: cache.max_size > 0,
                offload: self.coordinator.as_ref().map_or(false, |c| c.is_initialized()),
                progress_tracking: true,
                performance_monitoring: true,
            },
            cache,
            performance: self.monitor.stats(),
            coordinator: self.coordinator.as_ref().map(|c| c.stats()),
            model,
        }
    }

    /// 关闭离线通道，清空缓存与性能统计
    pub fn cleanup(&self) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.terminate();
        }
        self.cache.clear();
        self.monitor.reset();
        info!("评估门面资源已清理");
    }
}

impl PlanEvaluator for PlanningApi {
    fn sample(&mut self) -> EngineResult<()> {
        self.model_mut().sample()
    }

    fn random_plan(&mut self) -> DecisionVector {
        self.model_mut().random_plan()
    }

    fn evaluate(&mut self, decision: Option<&DecisionVector>) -> EngineResult<RobustObjectiveSet> {
        self.model_mut().evaluate(decision)
    }

    fn validate(&self, decision: &DecisionVector) -> EngineResult<ValidationReport> {
        self.lock_model().validate(decision)
    }

    fn export_state(&self) -> StateSnapshot {
        self.lock_model().export_state()
    }

    fn import_state(&mut self, snapshot: StateSnapshot) -> EngineResult<()> {
        self.model_mut().import_state(snapshot)
    }
}

// ==========================================
// 缓存键
// ==========================================

/// 情景缓存键: 规模 + 预测 + 标准差
fn scenario_cache_key(model: &PlanningModel) -> String {
    create_key(&[
        json!("scenarios"),
        json!(model.num_scenarios()),
        json!(model.horizon()),
        json!(model.demand().forecast),
        json!(model.demand().uncertainty),
    ])
}

/// 评估缓存键: 决策 + 模型修订号 + 尾部口径 + 目标集
fn evaluation_cache_key(model: &PlanningModel, decision: &DecisionVector) -> ApiResult<String> {
    let decision: Value = serde_json::to_value(decision).map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(create_key(&[
        json!("objectives"),
        decision,
        json!(model.revision()),
        json!(model.settings().cvar_tail_mode.as_str()),
        json!(model.config().objectives),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn small_api(seed: u64) -> PlanningApi {
        let config = PlanningConfig::default().with_horizon(4).with_scenarios(30);
        let settings = EvaluationSettings::default()
            .with_seed(seed)
            .with_task_timeout(Duration::from_secs(5));
        PlanningApi::from_settings(config, settings).unwrap()
    }

    #[tokio::test]
    async fn test_sample_async_without_channel_is_synchronous_then_cached() {
        let api = small_api(1);

        let first = api.sample_async(None).await.unwrap();
        assert_eq!(first.metadata.method, GenerationMethod::Synchronous);
        assert_eq!(first.scenarios.len(), 4 * 30);

        let second = api.sample_async(None).await.unwrap();
        assert_eq!(second.metadata.method, GenerationMethod::Cached);
        assert_eq!(second.scenarios, first.scenarios);
        assert_eq!(api.progress().active_count(), 0);
    }

    #[tokio::test]
    async fn test_sample_async_uses_offload_channel() {
        let api = small_api(2);
        assert!(api.initialize().await);

        let bundle = api.sample_async(None).await.unwrap();
        assert_eq!(bundle.metadata.method, GenerationMethod::Offloaded);
        assert_eq!(bundle.num_scenarios, 30);
        assert_eq!(api.with_model(|m| m.demand().scenarios.clone()), bundle.scenarios);

        let stats = api.performance_stats();
        assert!(stats.features.offload);
        assert_eq!(stats.coordinator.unwrap().tasks_completed, 1);
        api.cleanup();
    }

    #[tokio::test]
    async fn test_evaluate_async_caches_per_decision() {
        let api = small_api(3);
        let plan = api.random_plan();

        let first = api.evaluate_async(Some(plan.clone()), None).await.unwrap();
        assert_eq!(first.method, GenerationMethod::Synchronous);

        let second = api.evaluate_async(Some(plan.clone()), None).await.unwrap();
        assert_eq!(second.method, GenerationMethod::Cached);
        assert_eq!(second.objectives, first.objectives);

        // 供应变更后缓存失效
        let mut supply = api.with_model(|m| m.supply().clone());
        supply.capacity[0] += 1.0;
        api.update_supply(supply).unwrap();
        let third = api.evaluate_async(Some(plan), None).await.unwrap();
        assert_eq!(third.method, GenerationMethod::Synchronous);
    }

    #[tokio::test]
    async fn test_evaluate_async_rejects_wrong_length() {
        let api = small_api(4);
        let err = api
            .evaluate_async(Some(DecisionVector::zeros(3)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ConfigurationError { expected: 4, actual: 3, .. }));
        assert_eq!(api.progress().active_count(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_resets_cache_and_monitor() {
        let api = small_api(5);
        api.sample_async(None).await.unwrap();
        assert_eq!(api.cache().len(), 1);
        assert!(api.performance_stats().performance.contains_key("sample_async"));

        api.cleanup();
        let stats = api.performance_stats();
        assert_eq!(stats.cache.size, 0);
        assert!(stats.performance.is_empty());
    }
}
