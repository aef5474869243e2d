use std::collections::HashMap;

use crate::models::{InventorySnapshotEntry, ProductMasterEntry, VarianceRow};
use crate::service::aggregator::{snapshot_key, Aggregation};

/// 为 商品マスタ 的每一行生成突合結果, 保持原顺序, 不丢行
pub fn compute_variance(
    master: &[ProductMasterEntry],
    snapshot: &[InventorySnapshotEntry],
    aggregation: &Aggregation,
) -> Vec<VarianceRow> {
    // 同一品番后出现的覆盖先出现的
    let book: HashMap<&str, f64> = snapshot
        .iter()
        .map(|s| (snapshot_key(&s.code), s.book_quantity))
        .collect();

    master
        .iter()
        .map(|item| {
            let book_quantity = book.get(snapshot_key(&item.code)).copied().unwrap_or(0.0);
            let physical_quantity = aggregation.physical_quantity(&item.code);
            let variance = physical_quantity - book_quantity;

            VarianceRow {
                code: item.code.clone(),
                name: item.name.clone(),
                warehouse_code: item.warehouse_code.clone(),
                unit_price: item.unit_price,
                book_quantity,
                physical_quantity,
                variance,
                variance_value: variance_value(variance, item.unit_price),
            }
        })
        .collect()
}

/// 差分金額 = round(差分 × 单价), 四舍五入远离零
pub fn variance_value(variance: f64, unit_price: f64) -> i64 {
    // f64::round 本身就是 half-away-from-zero
    (variance * unit_price).round() as i64
}
