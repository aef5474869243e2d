use serde::{Deserialize, Serialize};

/// 一条实盘计数记录 (来自 OCR 棚卸表或 EC 表格)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub note: String,
    /// シートNo 或表格名称
    #[serde(default)]
    pub source_label: String,
    /// 部門
    #[serde(default)]
    pub department_label: String,
}

/// 记录来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    Optical,
    Spreadsheet,
}

/// 一次导入 = 一张表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountSheet {
    pub id: u64,
    pub kind: SheetKind,
    pub file_name: String,
    pub label: String,
    pub department: String,
    pub observations: Vec<Observation>,
}

/// 表导入后的概要 (含当前主数据下的品番错误预估)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub sheet_id: u64,
    pub kind: SheetKind,
    pub file_name: String,
    pub label: String,
    pub department: String,
    pub rows: usize,
    pub unmatched: usize,
}

/// 审核时对单行的修改, 未给出的字段保持原值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowUpdate {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl RowUpdate {
    pub fn apply(self, obs: &mut Observation) {
        if let Some(code) = self.code {
            obs.code = code;
        }
        if let Some(quantity) = self.quantity {
            obs.quantity = if quantity.is_finite() { quantity } else { 0.0 };
        }
        if let Some(note) = self.note {
            obs.note = note;
        }
    }
}

/// EC 表格导入的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub code: String,
    #[serde(default)]
    pub quantity: f64,
}

/// 表格解析协作方返回的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetImport {
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default)]
    pub items: Vec<ImportRow>,
}
