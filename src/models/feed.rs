use serde::{Deserialize, Serialize};

/// 商品マスタ 行
///
/// 品番按大小写不敏感匹配 (见 `service::aggregator::master_key`)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMasterEntry {
    pub code: String,
    pub name: String,
    pub warehouse_code: String,
    pub unit_price: f64,
}

/// 在庫一覧 行 (やよい在庫)
///
/// 品番按原样大小写敏感匹配 (见 `service::aggregator::snapshot_key`)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshotEntry {
    pub code: String,
    pub book_quantity: f64,
}
