use super::*;
use crate::domain::{DecisionVector, DemandModel, InventoryModel, ObjectiveKind, SupplyModel};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// H=2, N=2: 第二个情景在第 2 期出现缺货
fn fixture() -> (DecisionVector, SupplyModel, InventoryModel, DemandModel) {
    let decision = DecisionVector {
        production: vec![80.0, 80.0],
        procurement: vec![10.0, 10.0],
        distribution: vec![70.0, 70.0],
    };
    let supply = SupplyModel {
        capacity: vec![100.0, 0.0],
        lead_times: vec![2.0, 2.0],
        unit_cost: vec![10.0, 10.0],
    };
    let inventory = InventoryModel {
        levels: vec![20.0, 0.0],
        safety_stock: vec![15.0, 15.0],
        targets: vec![25.0, 25.0],
        holding_cost: vec![5.0, 5.0],
    };
    let mut demand = DemandModel::zeros(2, 2);
    demand.forecast = vec![100.0, 100.0];
    demand.scenarios = vec![100.0, 100.0, 100.0, 150.0];
    (decision, supply, inventory, demand)
}

#[test]
fn test_cost_evaluator_hand_computed() {
    let (decision, supply, inventory, demand) = fixture();
    let ctx = SimulationContext::new(&decision, &supply, &inventory, &demand, 2).unwrap();

    let raw = CostEvaluator::new().evaluate(&ctx);
    assert_eq!(raw.len(), 2);
    // 情景0: 991 + 1190
    assert!(approx(raw[0], 2181.0), "cost[0]={}", raw[0]);
    // 情景1: 991 + (890 + 4000 + 1300)
    assert!(approx(raw[1], 7181.0), "cost[1]={}", raw[1]);
}

#[test]
fn test_service_level_evaluator() {
    let (decision, supply, inventory, demand) = fixture();
    let ctx = SimulationContext::new(&decision, &supply, &inventory, &demand, 2).unwrap();

    let raw = ServiceLevelEvaluator::new().evaluate(&ctx);
    assert!(approx(raw[0], 1.0));
    assert!(approx(raw[1], 200.0 / 250.0));
}

#[test]
fn test_inventory_turns_evaluator() {
    let (decision, supply, inventory, demand) = fixture();
    let ctx = SimulationContext::new(&decision, &supply, &inventory, &demand, 2).unwrap();

    let raw = InventoryTurnsEvaluator::new().evaluate(&ctx);
    // 销量 200, 平均期初库存 (20 + 10) / 2 = 15, 年化系数 12/2
    assert!(approx(raw[0], 80.0), "turns[0]={}", raw[0]);
    assert!(approx(raw[1], 80.0), "turns[1]={}", raw[1]);
}

#[test]
fn test_sustainability_evaluator_zero_capacity_guard() {
    let (decision, supply, inventory, demand) = fixture();
    let ctx = SimulationContext::new(&decision, &supply, &inventory, &demand, 2).unwrap();

    let raw = SustainabilityEvaluator::new().evaluate(&ctx);
    // 第1期: 0.32 + 0.35 + 0.25; 第2期产能为 0: 0 + 0.35 + 0.25
    assert!(approx(raw[0], 0.76), "sustainability[0]={}", raw[0]);
    assert!(approx(raw[1], 0.76));
}

#[test]
fn test_zero_demand_edge_cases() {
    let (mut decision, supply, mut inventory, mut demand) = fixture();
    decision.production = vec![0.0, 0.0];
    decision.procurement = vec![0.0, 0.0];
    inventory.levels = vec![0.0, 0.0];
    demand.scenarios = vec![0.0; 4];
    let ctx = SimulationContext::new(&decision, &supply, &inventory, &demand, 2).unwrap();

    let raw = evaluate_all(&ctx, &ObjectiveKind::ALL);
    assert!(raw[&ObjectiveKind::ServiceLevel].iter().all(|v| approx(*v, 1.0)));
    assert!(raw[&ObjectiveKind::InventoryTurns].iter().all(|v| approx(*v, 0.0)));
    // 需求为 0 时浪费率按 0 处理, 结果有限
    let sustainability = &raw[&ObjectiveKind::Sustainability];
    assert!(sustainability.iter().all(|v| v.is_finite()));
    assert!(approx(sustainability[0], 0.6));
}

#[test]
fn test_context_rejects_mismatched_decision() {
    let (mut decision, supply, inventory, demand) = fixture();
    decision.distribution = vec![1.0; 3];

    let err = SimulationContext::new(&decision, &supply, &inventory, &demand, 2).unwrap_err();
    assert_eq!(
        err,
        EngineError::ConfigurationError {
            field: "distribution".to_string(),
            expected: 2,
            actual: 3,
        }
    );
}

#[test]
fn test_evaluate_all_respects_objective_subset() {
    let (decision, supply, inventory, demand) = fixture();
    let ctx = SimulationContext::new(&decision, &supply, &inventory, &demand, 2).unwrap();

    let raw = evaluate_all(&ctx, &[ObjectiveKind::Cost, ObjectiveKind::ServiceLevel]);
    assert_eq!(raw.len(), 2);
    assert!(raw.contains_key(&ObjectiveKind::Cost));
    assert!(!raw.contains_key(&ObjectiveKind::Sustainability));
    assert!(raw.values().all(|v| v.len() == ctx.num_scenarios()));
}

#[test]
fn test_evaluate_all_with_progress_reports_in_order() {
    let (decision, supply, inventory, demand) = fixture();
    let ctx = SimulationContext::new(&decision, &supply, &inventory, &demand, 2).unwrap();
    let objectives = [ObjectiveKind::Sustainability, ObjectiveKind::Cost];

    let mut calls = Vec::new();
    let raw = evaluate_all_with_progress(&ctx, &objectives, |kind, done, total| calls.push((kind, done, total)));

    assert_eq!(
        calls,
        vec![(ObjectiveKind::Sustainability, 1, 2), (ObjectiveKind::Cost, 2, 2)]
    );
    assert_eq!(raw, evaluate_all(&ctx, &objectives));
}
