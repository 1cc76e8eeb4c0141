// ==========================================
// IBP 鲁棒评估引擎 - 命令行入口
// ==========================================
// 流程: 读取环境配置 → 装配门面 → 生成情景 → 并发评估随机计划 → 输出统计
// ==========================================

use futures::future::join_all;
use ibp_optimization::api::{ApiResult, PlanningApi};
use ibp_optimization::config::ConfigManager;
use ibp_optimization::engine::{check_expectations, ExpectedResults};
use ibp_optimization::{logging, ObjectiveKind};

const DEMO_PLANS: usize = 5;

#[tokio::main]
async fn main() {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", ibp_optimization::APP_NAME);
    tracing::info!("系统版本: {}", ibp_optimization::VERSION);
    tracing::info!("==================================================");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "运行失败");
        std::process::exit(1);
    }
}

async fn run() -> ApiResult<()> {
    let config_manager = ConfigManager::from_env();
    let api = PlanningApi::from_config_manager(&config_manager)?;

    let offload_ready = api.initialize().await;
    tracing::info!(offload_ready, "门面初始化完成");

    let bundle = api.sample_async(None).await?;
    tracing::info!(
        num_scenarios = bundle.num_scenarios,
        horizon = bundle.horizon_months,
        method = %bundle.metadata.method,
        "情景已生成"
    );

    let plans: Vec<_> = (0..DEMO_PLANS).map(|_| api.random_plan()).collect();
    for (index, plan) in plans.iter().enumerate() {
        let report = api.validate(plan)?;
        tracing::info!(plan = index, valid = report.is_valid, score = report.score, "可行性校验");
    }

    let evaluations = join_all(plans.into_iter().map(|plan| api.evaluate_async(Some(plan), None))).await;

    let expected = ExpectedResults {
        service_level_min: Some(0.9),
        cost_range: None,
    };
    for (index, evaluation) in evaluations.into_iter().enumerate() {
        let evaluation = evaluation?;
        for kind in ObjectiveKind::ALL {
            if let Some(obj) = evaluation.objectives.get(kind) {
                tracing::info!(
                    plan = index,
                    objective = %kind,
                    mean = obj.mean,
                    std_dev = obj.std_dev,
                    cvar95 = obj.cvar95,
                    "目标统计"
                );
            }
        }
        let check = check_expectations(&evaluation.objectives, &expected);
        tracing::info!(plan = index, passed = check.passed, "期望校验");
    }

    match serde_json::to_string_pretty(&api.performance_stats()) {
        Ok(report) => println!("{}", report),
        Err(e) => tracing::warn!(error = %e, "性能报告序列化失败"),
    }

    api.cleanup();
    Ok(())
}
