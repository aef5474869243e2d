use serde::{Deserialize, Serialize};

use super::Observation;

/// 按折叠后品番汇总的实盘数量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedQuantity {
    pub code: String,
    pub total_quantity: f64,
    /// 参与汇总的记录条数
    pub observation_count: usize,
}

/// 品番エラー: 在商品マスタ中找不到的记录, 原样保留
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedObservation {
    pub code: String,
    pub quantity: f64,
    pub note: String,
    pub source_label: String,
    pub department_label: String,
}

impl From<&Observation> for UnmatchedObservation {
    fn from(obs: &Observation) -> Self {
        Self {
            code: obs.code.clone(),
            quantity: obs.quantity,
            note: obs.note.clone(),
            source_label: obs.source_label.clone(),
            department_label: obs.department_label.clone(),
        }
    }
}

/// 突合結果 行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceRow {
    pub code: String,
    pub name: String,
    pub warehouse_code: String,
    pub unit_price: f64,
    pub book_quantity: f64,
    pub physical_quantity: f64,
    /// 实盘 - 帐面, 负数为盘亏
    pub variance: f64,
    pub variance_value: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconSummary {
    pub total_rows: usize,
    /// 差分 != 0 的行数
    pub variance_rows: usize,
    pub unmatched: usize,
}

/// 引擎输出: 突合結果表 + 品番エラー一覧 + 统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconReport {
    pub variance: Vec<VarianceRow>,
    pub errors: Vec<UnmatchedObservation>,
    pub summary: ReconSummary,
}
