use serde_json::Value;

use crate::config::ImportConfig;
use crate::error::AppError;
use crate::feed::parse_number;
use crate::models::{CountSheet, ImportRow, Observation, SheetKind, SpreadsheetImport};

/// OCR 返回结果经过默认值填充后的形态
///
/// 输入来自不可信的识别服务: 任何字段都可能缺失或类型不对,
/// 统一在这里补默认值, 下游不再做空值判断。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub sheet_no: Option<String>,
    pub department: String,
    pub items: Vec<ExtractedItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedItem {
    pub code: String,
    pub quantity: f64,
    pub note: String,
}

/// 解析 OCR 服务返回的文本 (可能被 ```json 代码块包裹)
pub fn parse_extraction(text: &str) -> Result<ExtractionResult, AppError> {
    let body = strip_code_fence(text).trim();
    let value: Value = serde_json::from_str(body)?;
    Ok(ExtractionResult::from_value(&value))
}

/// 取出第一个 ``` 代码块的内容, 没有完整代码块时原样返回
fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let rest = &text[open + 3..];
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.find("```") {
        Some(close) => &rest[..close],
        None => text,
    }
}

impl ExtractionResult {
    pub fn from_value(value: &Value) -> Self {
        let header = value.get("header");
        let items = value
            .get("items")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(ExtractedItem::from_value).collect())
            .unwrap_or_default();

        Self {
            sheet_no: header.and_then(|h| text_field(h.get("シートNo"))),
            department: header.and_then(|h| text_field(h.get("部門"))).unwrap_or_default(),
            items,
        }
    }
}

impl ExtractedItem {
    fn from_value(value: &Value) -> Self {
        Self {
            code: code_field(value.get("品番")),
            quantity: number_field(value.get("数量")),
            note: text_field(value.get("備考")).unwrap_or_default(),
        }
    }
}

/// 字符串字段: 数字按十进制文本处理, 其他类型视为缺失, 空串视为缺失
fn text_field(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// 品番: 去掉首尾空白; 只有空白时保留原值, 作为品番エラー 出现在一覧里
fn code_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() && s.trim().is_empty() => s.clone(),
        other => text_field(other).unwrap_or_default(),
    }
}

/// 数值字段: 缺失或非法均为 0
fn number_field(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => parse_number(s),
        _ => 0.0,
    }
}

/// OCR 棚卸表 -> CountSheet
///
/// `ordinal` 是本会话已导入的 OCR 表数量, 用于生成缺失シートNo 的占位值。
pub fn optical_sheet(id: u64, file_name: &str, result: ExtractionResult, ordinal: usize) -> CountSheet {
    let label = result.sheet_no.unwrap_or_else(|| (ordinal + 1).to_string());
    let department = result.department;

    let observations = result
        .items
        .into_iter()
        .map(|item| Observation {
            code: item.code,
            quantity: item.quantity,
            note: item.note,
            source_label: label.clone(),
            department_label: department.clone(),
        })
        .collect();

    CountSheet {
        id,
        kind: SheetKind::Optical,
        file_name: file_name.to_string(),
        label,
        department,
        observations,
    }
}

/// EC 表格导入 -> CountSheet, 部门固定为配置的标签
pub fn spreadsheet_sheet(id: u64, file_name: &str, import: SpreadsheetImport, cfg: &ImportConfig) -> CountSheet {
    let label = import
        .sheet_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| cfg.default_sheet_label.clone());
    let department = cfg.department.clone();

    let observations = import
        .items
        .into_iter()
        .map(|row| Observation {
            code: row.code.trim().to_string(),
            quantity: if row.quantity.is_finite() { row.quantity } else { 0.0 },
            note: String::new(),
            source_label: label.clone(),
            department_label: department.clone(),
        })
        .collect();

    CountSheet {
        id,
        kind: SheetKind::Spreadsheet,
        file_name: file_name.to_string(),
        label,
        department,
        observations,
    }
}

/// 读取 EC 棚卸表导出的 CSV: 第一行为表头, 第1列=SKU, 第2列=数量
pub fn parse_import_csv(text: &str) -> Result<SpreadsheetImport, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record?;
        let code = record.get(0).unwrap_or("").trim();
        if code.is_empty() || code == "SKU" {
            continue;
        }
        items.push(ImportRow {
            code: code.to_string(),
            quantity: parse_number(record.get(1).unwrap_or("")),
        });
    }

    Ok(SpreadsheetImport { sheet_name: None, items })
}
