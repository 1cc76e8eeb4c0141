// ==========================================
// 引擎集成测试
// ==========================================
// 职责: 验证 采样 → 仿真 → 聚合 → 期望校验 的完整数据流
// 场景: 零波动确定性场景 / 大样本统计 / CVaR 尾部口径 / 行业预设
// ==========================================

use ibp_optimization::config::{CvarTailMode, EvaluationSettings, PlanningConfig};
use ibp_optimization::domain::{DecisionVector, IndustryType, InventoryModel, ObjectiveKind, SupplyModel};
use ibp_optimization::engine::{check_expectations, CheckStatus, ExpectedResults, PlanEvaluator, PlanningModel};

// ==========================================
// 测试辅助函数
// ==========================================

fn seeded_model(horizon: usize, scenarios: usize, seed: u64) -> PlanningModel {
    let config = PlanningConfig::default().with_horizon(horizon).with_scenarios(scenarios);
    PlanningModel::new(config, EvaluationSettings::default().with_seed(seed)).unwrap()
}

/// 两期、无波动、产量恰好覆盖需求
fn deterministic_model() -> PlanningModel {
    let mut model = seeded_model(2, 10, 1);
    model
        .update_supply(SupplyModel {
            capacity: vec![1000.0, 1000.0],
            lead_times: vec![1.0, 1.0],
            unit_cost: vec![10.0, 10.0],
        })
        .unwrap();
    model
        .update_inventory(InventoryModel {
            levels: vec![0.0, 0.0],
            safety_stock: vec![0.0, 0.0],
            targets: vec![0.0, 0.0],
            holding_cost: vec![1.0, 1.0],
        })
        .unwrap();
    model
        .update_demand_forecast(vec![100.0, 100.0], Some(vec![0.0, 0.0]))
        .unwrap();
    model
}

fn exact_plan() -> DecisionVector {
    DecisionVector {
        production: vec![100.0, 100.0],
        procurement: vec![0.0, 0.0],
        distribution: vec![100.0, 100.0],
    }
}

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_deterministic_flow_end_to_end() {
    let mut model = deterministic_model();
    assert!(model.demand().scenarios.iter().all(|v| *v == 100.0));

    let objectives = model.evaluate(Some(&exact_plan())).unwrap();

    let cost = objectives.cost().unwrap();
    println!("成本统计: mean={}, cvar95={}", cost.mean, cost.cvar95);
    assert_eq!(cost.mean, 2000.0);
    assert_eq!(cost.cvar95, 2000.0);
    assert_eq!(objectives.service_level().unwrap().mean, 1.0);

    // 各情景相同，分布退化
    for (kind, obj) in objectives.iter() {
        assert!(obj.std_dev.abs() < 1e-9, "objective={}, std_dev={}", kind, obj.std_dev);
        assert_eq!(obj.min, obj.max);
        assert_eq!(obj.raw_scenarios.len(), 10);
    }

    let report = check_expectations(
        &objectives,
        &ExpectedResults {
            service_level_min: Some(0.95),
            cost_range: Some((1500.0, 2500.0)),
        },
    );
    assert!(report.passed);

    let report = check_expectations(
        &objectives,
        &ExpectedResults {
            service_level_min: Some(0.95),
            cost_range: Some((0.0, 1000.0)),
        },
    );
    assert!(!report.passed);
    assert_eq!(report.details[0].status, CheckStatus::Pass);
    assert_eq!(report.details[1].status, CheckStatus::Fail);
}

#[test]
fn test_shortage_lowers_service_level() {
    let mut model = deterministic_model();
    let mut plan = exact_plan();
    plan.production = vec![50.0, 50.0];

    let objectives = model.evaluate(Some(&plan)).unwrap();
    assert_eq!(objectives.service_level().unwrap().mean, 0.5);
    assert!(objectives.cost().unwrap().mean > 2000.0 * 0.5);
}

#[test]
fn test_large_sample_matches_forecast_mean() {
    let mut model = seeded_model(3, 4000, 42);
    model
        .update_demand_forecast(vec![1000.0; 3], Some(vec![100.0; 3]))
        .unwrap();

    let scenarios = &model.demand().scenarios;
    for period in 0..3 {
        let mean: f64 = scenarios.iter().skip(period).step_by(3).sum::<f64>() / 4000.0;
        println!("第 {} 期样本均值: {:.2}", period, mean);
        assert!((mean - 1000.0).abs() < 15.0, "period={}, mean={}", period, mean);
    }
}

#[test]
fn test_objective_aware_tail_for_service_level() {
    let config = PlanningConfig::default().with_horizon(6).with_scenarios(200);
    let upper_settings = EvaluationSettings::default().with_seed(5);
    let aware_settings = upper_settings.clone().with_cvar_tail_mode(CvarTailMode::ObjectiveAware);

    let mut upper = PlanningModel::new(config.clone(), upper_settings).unwrap();
    let mut aware = PlanningModel::new(config, aware_settings).unwrap();

    let plan = upper.random_plan();
    let upper_objectives = upper.evaluate(Some(&plan)).unwrap();
    let aware_objectives = aware.evaluate(Some(&plan)).unwrap();

    let upper_service = upper_objectives.service_level().unwrap();
    let aware_service = aware_objectives.service_level().unwrap();
    assert!(upper_service.cvar95 >= upper_service.mean);
    assert!(aware_service.cvar95 <= aware_service.mean);

    // 成本方向一致，两种口径结果相同
    assert_eq!(upper_objectives.cost(), aware_objectives.cost());
}

#[test]
fn test_industry_preset_limits_objectives() {
    let config = PlanningConfig::for_industry(IndustryType::Retail).with_scenarios(50);
    let mut model = PlanningModel::new(config, EvaluationSettings::default().with_seed(3)).unwrap();

    let objectives = model.evaluate(None).unwrap();
    assert_eq!(
        objectives.kinds().collect::<Vec<_>>(),
        vec![ObjectiveKind::Cost, ObjectiveKind::ServiceLevel, ObjectiveKind::InventoryTurns]
    );
    assert!(objectives.sustainability().is_none());
}

#[test]
fn test_state_transfer_between_models() {
    let mut source = deterministic_model();
    source.evaluate(Some(&exact_plan())).unwrap();
    let snapshot = source.export_state();

    let mut target = seeded_model(5, 30, 77);
    target.import_state(snapshot).unwrap();

    assert_eq!(target.horizon(), 2);
    assert_eq!(target.num_scenarios(), 10);
    // 零波动预测在重新采样后仍得到相同情景
    let objectives = target.evaluate(None).unwrap();
    assert_eq!(objectives.cost().unwrap().mean, 2000.0);
}
