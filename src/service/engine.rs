use crate::models::{InventorySnapshotEntry, Observation, ProductMasterEntry, ReconReport};
use crate::service::aggregator::{aggregate, master_keys};
use crate::service::report::assemble;
use crate::service::variance::compute_variance;

/// 单次、无状态的突合: 汇总 -> 差分 -> 组装
///
/// 纯函数, 相同输入得到相同输出; 数据质量问题只做分类, 不会失败。
pub fn reconcile(
    master: &[ProductMasterEntry],
    snapshot: &[InventorySnapshotEntry],
    observations: &[Observation],
) -> ReconReport {
    let keys = master_keys(master);
    let aggregation = aggregate(&keys, observations);
    let variance = compute_variance(master, snapshot, &aggregation);

    tracing::info!(
        "突合完成: 商品 {} 件, 实盘记录 {} 条, 汇总品番 {} 个, 品番エラー {} 件",
        master.len(),
        observations.len(),
        aggregation.quantities.len(),
        aggregation.unmatched.len()
    );

    assemble(variance, aggregation.unmatched)
}
