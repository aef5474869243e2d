use serde::{Deserialize, Serialize};

/// 固定列位置文本文件的列布局 (0 起始下标)
///
/// 两种主数据文件都没有表头行, 历史版本里列位置发生过变化,
/// 所以布局作为配置项而不是写死在解析器里。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    /// 品番所在列
    pub code: usize,
    /// 商品名所在列
    #[serde(default)]
    pub name: Option<usize>,
    /// 倉庫コード所在列
    #[serde(default)]
    pub warehouse: Option<usize>,
    /// 数值列 (商品マスタ: 单价, 在庫一覧: 帐面数量)
    pub value: usize,
    /// 有效行的最少列数, 不足则丢弃
    ///
    /// 默认只要求品番列存在; 导出时被截掉的尾部空列按 ""/0 处理。
    pub min_columns: usize,
    /// 品番为 1~4 位纯数字的行视为分类/小计行
    #[serde(default)]
    pub skip_category_codes: bool,
}

impl ColumnLayout {
    /// 商品マスタ (Shodai.txt): col0=品番, col1=商品名, col18=倉庫コード, col34=单价
    pub fn product_master() -> Self {
        Self {
            code: 0,
            name: Some(1),
            warehouse: Some(18),
            value: 34,
            min_columns: 1,
            skip_category_codes: true,
        }
    }

    /// 在庫一覧 (Zaikoichi.txt): col2=品番, col11=やよい在庫
    pub fn inventory_snapshot() -> Self {
        Self {
            code: 2,
            name: None,
            warehouse: None,
            value: 11,
            min_columns: 3,
            skip_category_codes: false,
        }
    }
}
