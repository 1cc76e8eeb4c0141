// ==========================================
// IBP 鲁棒评估引擎 - 领域类型定义
// ==========================================
// 职责: 目标/不确定性/行业/生成方式等枚举
// 序列化格式: camelCase (与离线通道协议一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 评估目标 (Objective Kind)
// ==========================================
// 顺序即输出顺序: cost → serviceLevel → inventoryTurns → sustainability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectiveKind {
    Cost,           // 总成本
    ServiceLevel,   // 服务水平
    InventoryTurns, // 库存周转
    Sustainability, // 可持续性
}

impl ObjectiveKind {
    /// 全部目标（默认目标集）
    pub const ALL: [ObjectiveKind; 4] = [
        ObjectiveKind::Cost,
        ObjectiveKind::ServiceLevel,
        ObjectiveKind::InventoryTurns,
        ObjectiveKind::Sustainability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveKind::Cost => "cost",
            ObjectiveKind::ServiceLevel => "serviceLevel",
            ObjectiveKind::InventoryTurns => "inventoryTurns",
            ObjectiveKind::Sustainability => "sustainability",
        }
    }

    /// 优化方向：成本越小越好，其余越大越好
    pub fn direction(&self) -> OptimizationDirection {
        match self {
            ObjectiveKind::Cost => OptimizationDirection::Minimize,
            _ => OptimizationDirection::Maximize,
        }
    }
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ObjectiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], "").as_str() {
            "cost" => Ok(ObjectiveKind::Cost),
            "servicelevel" => Ok(ObjectiveKind::ServiceLevel),
            "inventoryturns" => Ok(ObjectiveKind::InventoryTurns),
            "sustainability" => Ok(ObjectiveKind::Sustainability),
            other => Err(format!("未知评估目标: {}", other)),
        }
    }
}

// ==========================================
// 优化方向 (Optimization Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptimizationDirection {
    Minimize,
    Maximize,
}

// ==========================================
// 尾部风险方向 (Risk Tail)
// ==========================================
// Upper: 取排序后的高端尾部; Lower: 取低端尾部
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskTail {
    Upper,
    Lower,
}

impl fmt::Display for RiskTail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTail::Upper => write!(f, "UPPER"),
            RiskTail::Lower => write!(f, "LOWER"),
        }
    }
}

// ==========================================
// 不确定性类型 (Uncertainty Type)
// ==========================================
// 说明: 仅作为配置元数据保留，采样只针对需求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UncertaintyType {
    Demand,
    Supply,
    LeadTime,
    Cost,
    Transportation,
}

impl fmt::Display for UncertaintyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UncertaintyType::Demand => write!(f, "demand"),
            UncertaintyType::Supply => write!(f, "supply"),
            UncertaintyType::LeadTime => write!(f, "leadTime"),
            UncertaintyType::Cost => write!(f, "cost"),
            UncertaintyType::Transportation => write!(f, "transportation"),
        }
    }
}

// ==========================================
// 行业类型 (Industry Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndustryType {
    Manufacturing,
    Retail,
    Distribution,
}

impl IndustryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndustryType::Manufacturing => "manufacturing",
            IndustryType::Retail => "retail",
            IndustryType::Distribution => "distribution",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            IndustryType::Manufacturing => "制造业",
            IndustryType::Retail => "零售业",
            IndustryType::Distribution => "分销业",
        }
    }
}

impl std::str::FromStr for IndustryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manufacturing" => Ok(IndustryType::Manufacturing),
            "retail" => Ok(IndustryType::Retail),
            "distribution" => Ok(IndustryType::Distribution),
            other => Err(format!("未知行业类型: {}", other)),
        }
    }
}

// ==========================================
// 结果生成方式 (Generation Method)
// ==========================================
// 异步路径返回结果时标注其来源，不向调用方抛出离线失败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationMethod {
    Offloaded,   // 后台通道生成
    Synchronous, // 同步生成
    Fallback,    // 离线失败后的同步兜底
    Cached,      // 缓存命中
}

impl fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMethod::Offloaded => write!(f, "offloaded"),
            GenerationMethod::Synchronous => write!(f, "synchronous"),
            GenerationMethod::Fallback => write!(f, "fallback"),
            GenerationMethod::Cached => write!(f, "cached"),
        }
    }
}

// ==========================================
// 决策变量 (Decision Variable)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecisionVariable {
    Production,
    Procurement,
    Distribution,
}

impl DecisionVariable {
    pub const ALL: [DecisionVariable; 3] = [
        DecisionVariable::Production,
        DecisionVariable::Procurement,
        DecisionVariable::Distribution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionVariable::Production => "production",
            DecisionVariable::Procurement => "procurement",
            DecisionVariable::Distribution => "distribution",
        }
    }
}

impl fmt::Display for DecisionVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_kind_parse_and_direction() {
        assert_eq!("serviceLevel".parse::<ObjectiveKind>().unwrap(), ObjectiveKind::ServiceLevel);
        assert_eq!("inventory_turns".parse::<ObjectiveKind>().unwrap(), ObjectiveKind::InventoryTurns);
        assert!("profit".parse::<ObjectiveKind>().is_err());

        assert_eq!(ObjectiveKind::Cost.direction(), OptimizationDirection::Minimize);
        assert_eq!(ObjectiveKind::Sustainability.direction(), OptimizationDirection::Maximize);
    }

    #[test]
    fn test_objective_kind_serde_camel_case() {
        let json = serde_json::to_string(&ObjectiveKind::InventoryTurns).unwrap();
        assert_eq!(json, "\"inventoryTurns\"");
    }
}
