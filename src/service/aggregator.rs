use std::collections::HashSet;

use indexmap::IndexMap;

use crate::models::{AggregatedQuantity, Observation, ProductMasterEntry, UnmatchedObservation};

// 品番键的大小写规则有意不统一:
//   商品マスタ 查找/汇总: 折叠为小写 (`master_key`)
//   在庫一覧 查找: 原样比较 (`snapshot_key`)
// 在庫一覧 的品番大小写取决于导出系统, 不能强行折叠。

/// 商品マスタ 与实盘汇总使用的键 (大小写不敏感)
pub fn master_key(code: &str) -> String {
    code.to_lowercase()
}

/// 在庫一覧 使用的键 (大小写敏感, 原样)
pub fn snapshot_key(code: &str) -> &str {
    code
}

/// 商品マスタ 的折叠键集合
pub fn master_keys(master: &[ProductMasterEntry]) -> HashSet<String> {
    master.iter().map(|m| master_key(&m.code)).collect()
}

/// 单条记录的去向
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// 计入汇总, 携带折叠后的键
    Accepted(String),
    /// 品番为空, 静默忽略
    Dropped,
    /// 商品マスタ 中不存在, 进入品番エラー一覧
    Unmatched,
}

pub fn classify(obs: &Observation, keys: &HashSet<String>) -> RowOutcome {
    if obs.code.is_empty() {
        return RowOutcome::Dropped;
    }
    let key = master_key(&obs.code);
    if keys.contains(&key) {
        RowOutcome::Accepted(key)
    } else {
        RowOutcome::Unmatched
    }
}

/// 汇总结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// 按键首次出现顺序
    pub quantities: IndexMap<String, AggregatedQuantity>,
    /// 按记录顺序, 不合并
    pub unmatched: Vec<UnmatchedObservation>,
}

impl Aggregation {
    /// 按折叠键查实盘数量, 不存在为 0
    pub fn physical_quantity(&self, code: &str) -> f64 {
        self.quantities
            .get(&master_key(code))
            .map(|a| a.total_quantity)
            .unwrap_or(0.0)
    }

    pub fn totals(&self) -> Vec<AggregatedQuantity> {
        self.quantities.values().cloned().collect()
    }
}

/// 一次性汇总全部记录
pub fn aggregate(keys: &HashSet<String>, observations: &[Observation]) -> Aggregation {
    let mut result = Aggregation::default();

    for obs in observations {
        match classify(obs, keys) {
            RowOutcome::Accepted(key) => {
                let entry = result
                    .quantities
                    .entry(key.clone())
                    .or_insert_with(|| AggregatedQuantity {
                        code: key,
                        total_quantity: 0.0,
                        observation_count: 0,
                    });
                entry.total_quantity += obs.quantity;
                entry.observation_count += 1;
            }
            RowOutcome::Unmatched => result.unmatched.push(UnmatchedObservation::from(obs)),
            RowOutcome::Dropped => {}
        }
    }

    result
}
