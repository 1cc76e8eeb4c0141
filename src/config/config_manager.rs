// ==========================================
// IBP 鲁棒评估引擎 - 配置管理器
// ==========================================
// 职责: 运行参数加载、查询、覆写管理
// 存储: 进程内 key-value（支持环境变量覆写与快照恢复）
// ==========================================

use crate::config::planning_config::PlanningConfig;
use crate::domain::types::{IndustryType, ObjectiveKind, OptimizationDirection, RiskTail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::sync::Mutex;
use std::time::Duration;

// ==========================================
// CvarTailMode - CVaR 尾部口径
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvarTailMode {
    /// 所有目标均取高端尾部（历史口径）
    Upper,
    /// 按目标方向取最差尾部：最小化目标取高端，最大化目标取低端
    ObjectiveAware,
}

impl CvarTailMode {
    /// 目标对应的尾部方向
    pub fn tail_for(&self, kind: ObjectiveKind) -> RiskTail {
        match self {
            CvarTailMode::Upper => RiskTail::Upper,
            CvarTailMode::ObjectiveAware => match kind.direction() {
                OptimizationDirection::Minimize => RiskTail::Upper,
                OptimizationDirection::Maximize => RiskTail::Lower,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CvarTailMode::Upper => "upper",
            CvarTailMode::ObjectiveAware => "objective_aware",
        }
    }
}

impl std::str::FromStr for CvarTailMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upper" => Ok(CvarTailMode::Upper),
            "objective_aware" | "objective-aware" => Ok(CvarTailMode::ObjectiveAware),
            other => Err(format!("未知 CVaR 尾部口径: {}", other)),
        }
    }
}

// ==========================================
// EvaluationSettings - 评估运行参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSettings {
    /// 缓存容量上限
    pub cache_max_size: usize,
    /// 缓存默认 TTL
    pub cache_ttl: Duration,
    /// 离线任务超时
    pub task_timeout: Duration,
    /// 情景内序列相关系数 ρ
    pub serial_correlation: f64,
    /// 随机种子（None 表示使用系统熵）
    pub scenario_seed: Option<u64>,
    /// CVaR 尾部口径
    pub cvar_tail_mode: CvarTailMode,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            cache_max_size: defaults::CACHE_MAX_SIZE,
            cache_ttl: Duration::from_millis(defaults::CACHE_TTL_MS),
            task_timeout: Duration::from_millis(defaults::TASK_TIMEOUT_MS),
            serial_correlation: defaults::SERIAL_CORRELATION,
            scenario_seed: None,
            cvar_tail_mode: CvarTailMode::Upper,
        }
    }
}

impl EvaluationSettings {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.scenario_seed = Some(seed);
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_cvar_tail_mode(mut self, mode: CvarTailMode) -> Self {
        self.cvar_tail_mode = mode;
        self
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    values: Mutex<HashMap<String, String>>,
}

impl ConfigManager {
    /// 创建空配置（全部取默认值）
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
        }
    }

    /// 从已有键值创建
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    /// 从环境变量创建
    ///
    /// # 环境变量
    /// - IBP_CACHE_MAX_SIZE / IBP_CACHE_TTL_MS
    /// - IBP_TASK_TIMEOUT_MS
    /// - IBP_SCENARIO_SEED / IBP_SERIAL_CORRELATION
    /// - IBP_CVAR_TAIL: upper | objective_aware
    /// - IBP_INDUSTRY / IBP_HORIZON_MONTHS / IBP_NUM_SCENARIOS
    pub fn from_env() -> Self {
        let manager = Self::new();
        for (env_key, config_key) in env_keys::MAPPING {
            if let Ok(value) = std::env::var(env_key) {
                let value = value.trim().to_string();
                if !value.is_empty() {
                    tracing::debug!(env_key, config_key, value = %value, "环境变量覆写配置");
                    manager.set(config_key, &value);
                }
            }
        }
        manager
    }

    /// 写入配置值
    pub fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
    }

    /// 读取配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> String {
        self.get_global_config_value(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// 解析数值配置，格式错误时回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> T
    where
        T: std::str::FromStr + Copy,
    {
        match self.get_global_config_value(key) {
            Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                default
            }),
            None => default,
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(serde_json::to_string(&*values)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        let mut count = 0;
        for (key, value) in config_map {
            if key.starts_with("__meta_") {
                continue;
            }
            values.insert(key, value);
            count += 1;
        }
        Ok(count)
    }

    // ===== 缓存配置 =====

    pub fn get_cache_max_size(&self) -> usize {
        self.get_parsed_or_default(config_keys::CACHE_MAX_SIZE, defaults::CACHE_MAX_SIZE)
    }

    pub fn get_cache_ttl(&self) -> Duration {
        Duration::from_millis(
            self.get_parsed_or_default(config_keys::CACHE_TTL_MS, defaults::CACHE_TTL_MS),
        )
    }

    // ===== 离线任务配置 =====

    pub fn get_task_timeout(&self) -> Duration {
        Duration::from_millis(
            self.get_parsed_or_default(config_keys::TASK_TIMEOUT_MS, defaults::TASK_TIMEOUT_MS),
        )
    }

    // ===== 采样配置 =====

    pub fn get_serial_correlation(&self) -> f64 {
        let rho =
            self.get_parsed_or_default(config_keys::SERIAL_CORRELATION, defaults::SERIAL_CORRELATION);
        if (0.0..1.0).contains(&rho) {
            rho
        } else {
            tracing::warn!(rho, "序列相关系数超出 [0,1)，使用默认值");
            defaults::SERIAL_CORRELATION
        }
    }

    pub fn get_scenario_seed(&self) -> Option<u64> {
        self.get_global_config_value(config_keys::SCENARIO_SEED)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
    }

    pub fn get_cvar_tail_mode(&self) -> CvarTailMode {
        let value = self.get_config_or_default(config_keys::CVAR_TAIL, "upper");
        value.parse().unwrap_or_else(|e: String| {
            tracing::warn!(error = %e, "CVaR 尾部口径配置错误，使用 upper");
            CvarTailMode::Upper
        })
    }

    // ===== 规划配置 =====

    /// 规划配置：行业预设 + 规划期/情景数覆写
    pub fn get_planning_config(&self) -> PlanningConfig {
        let base = match self.get_global_config_value(config_keys::INDUSTRY) {
            Some(raw) => match raw.parse::<IndustryType>() {
                Ok(industry) => PlanningConfig::for_industry(industry),
                Err(e) => {
                    tracing::warn!(error = %e, "行业配置错误，使用默认规划配置");
                    PlanningConfig::default()
                }
            },
            None => PlanningConfig::default(),
        };

        let horizon = self.get_parsed_or_default(config_keys::HORIZON_MONTHS, base.horizon_months);
        let scenarios = self.get_parsed_or_default(config_keys::NUM_SCENARIOS, base.num_scenarios);
        base.with_horizon(horizon).with_scenarios(scenarios)
    }

    /// 汇总为评估运行参数
    pub fn evaluation_settings(&self) -> EvaluationSettings {
        EvaluationSettings {
            cache_max_size: self.get_cache_max_size(),
            cache_ttl: self.get_cache_ttl(),
            task_timeout: self.get_task_timeout(),
            serial_correlation: self.get_serial_correlation(),
            scenario_seed: self.get_scenario_seed(),
            cvar_tail_mode: self.get_cvar_tail_mode(),
        }
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const CACHE_MAX_SIZE: usize = 200;
    pub const CACHE_TTL_MS: u64 = 600_000; // 10 分钟
    pub const TASK_TIMEOUT_MS: u64 = 60_000; // 60 秒
    pub const SERIAL_CORRELATION: f64 = 0.3;
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 缓存
    pub const CACHE_MAX_SIZE: &str = "cache_max_size";
    pub const CACHE_TTL_MS: &str = "cache_ttl_ms";

    // 离线任务
    pub const TASK_TIMEOUT_MS: &str = "task_timeout_ms";

    // 采样
    pub const SCENARIO_SEED: &str = "scenario_seed";
    pub const SERIAL_CORRELATION: &str = "serial_correlation";

    // 风险统计
    pub const CVAR_TAIL: &str = "cvar_tail";

    // 规划
    pub const INDUSTRY: &str = "industry";
    pub const HORIZON_MONTHS: &str = "horizon_months";
    pub const NUM_SCENARIOS: &str = "num_scenarios";
}

mod env_keys {
    use super::config_keys;

    pub const MAPPING: [(&str, &str); 9] = [
        ("IBP_CACHE_MAX_SIZE", config_keys::CACHE_MAX_SIZE),
        ("IBP_CACHE_TTL_MS", config_keys::CACHE_TTL_MS),
        ("IBP_TASK_TIMEOUT_MS", config_keys::TASK_TIMEOUT_MS),
        ("IBP_SCENARIO_SEED", config_keys::SCENARIO_SEED),
        ("IBP_SERIAL_CORRELATION", config_keys::SERIAL_CORRELATION),
        ("IBP_CVAR_TAIL", config_keys::CVAR_TAIL),
        ("IBP_INDUSTRY", config_keys::INDUSTRY),
        ("IBP_HORIZON_MONTHS", config_keys::HORIZON_MONTHS),
        ("IBP_NUM_SCENARIOS", config_keys::NUM_SCENARIOS),
    ];
}
