// ==========================================
// IBP 鲁棒评估引擎 - 数据源协作方接口
// ==========================================
// 职责: 定义外部数据加载协作方的契约
// 说明: 文件/网络加载不在本库范围内，由调用方实现该 trait
// ==========================================

use crate::domain::{InventoryModel, SupplyModel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// 一次加载得到的规划数据
///
/// 未提供的部分保持模型现值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningDataset {
    #[serde(default)]
    pub forecast: Option<Vec<f64>>,
    #[serde(default)]
    pub uncertainty: Option<Vec<f64>>,
    #[serde(default)]
    pub supply: Option<SupplyModel>,
    #[serde(default)]
    pub inventory: Option<InventoryModel>,
}

/// 规划数据源 Trait
#[async_trait]
pub trait PlanningDataSource: Send + Sync {
    /// 数据源名称（用于日志）
    fn name(&self) -> &str;

    /// 加载规划数据
    ///
    /// # 返回
    /// - Ok(PlanningDataset): 需求/供应/库存数据
    /// - Err: 读取或解析失败
    async fn load(&self) -> Result<PlanningDataset, Box<dyn Error + Send + Sync>>;
}

/// 内存数据源（测试与演示使用）
#[derive(Debug, Clone)]
pub struct StaticDataSource {
    name: String,
    dataset: PlanningDataset,
}

impl StaticDataSource {
    pub fn new(name: impl Into<String>, dataset: PlanningDataset) -> Self {
        Self {
            name: name.into(),
            dataset,
        }
    }

    /// 从 JSON 文本构造
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(name, serde_json::from_str(json)?))
    }
}

#[async_trait]
impl PlanningDataSource for StaticDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<PlanningDataset, Box<dyn Error + Send + Sync>> {
        Ok(self.dataset.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_from_json() {
        let source = StaticDataSource::from_json(
            "sample",
            r#"{"forecast": [100.0, 110.0], "uncertainty": [10.0, 11.0]}"#,
        )
        .unwrap();

        let dataset = source.load().await.unwrap();
        assert_eq!(source.name(), "sample");
        assert_eq!(dataset.forecast, Some(vec![100.0, 110.0]));
        assert!(dataset.supply.is_none());
    }
}
