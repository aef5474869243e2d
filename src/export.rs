use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{ReconReport, UnmatchedObservation, VarianceRow};

const VARIANCE_HEADER: [&str; 8] = [
    "品番",
    "商品名",
    "倉庫コード",
    "単価",
    "やよい在庫",
    "実地棚卸数",
    "差分",
    "差分金額",
];

const ERROR_HEADER: [&str; 5] = ["品番", "数量", "備考", "シートNo", "部門"];

/// 可导出的表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTable {
    /// 突合結果
    Variance,
    /// 品番エラー一覧
    Errors,
}

impl ExportTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportTable::Variance => "variance",
            ExportTable::Errors => "errors",
        }
    }
}

impl FromStr for ExportTable {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches(".csv") {
            "variance" => Ok(ExportTable::Variance),
            "errors" => Ok(ExportTable::Errors),
            other => Err(AppError::UnknownTable(other.to_string())),
        }
    }
}

/// 棚卸突合_2026-01-31_variance.csv
pub fn export_file_name(table: ExportTable, date: NaiveDate) -> String {
    format!("棚卸突合_{}_{}.csv", date.format("%Y-%m-%d"), table.as_str())
}

/// Content-Disposition 的 filename* 参数 (RFC 5987)
pub fn percent_encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len() * 3);
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// 旧客户端用的 ASCII 文件名
pub fn ascii_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect()
}

pub fn render(report: &ReconReport, table: ExportTable) -> Result<Vec<u8>, AppError> {
    match table {
        ExportTable::Variance => render_variance_csv(&report.variance),
        ExportTable::Errors => render_errors_csv(&report.errors),
    }
}

/// 导出突合結果 (表头 + 数据行)
pub fn render_variance_csv(rows: &[VarianceRow]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(VARIANCE_HEADER).map_err(render_error)?;

    for row in rows {
        writer.write_record(&[
            row.code.clone(),
            row.name.clone(),
            row.warehouse_code.clone(),
            row.unit_price.to_string(),
            row.book_quantity.to_string(),
            row.physical_quantity.to_string(),
            row.variance.to_string(),
            row.variance_value.to_string(),
        ])
        .map_err(render_error)?;
    }

    writer.into_inner().map_err(render_error)
}

/// 导出品番エラー一覧
pub fn render_errors_csv(rows: &[UnmatchedObservation]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ERROR_HEADER).map_err(render_error)?;

    for row in rows {
        writer.write_record(&[
            row.code.clone(),
            row.quantity.to_string(),
            row.note.clone(),
            row.source_label.clone(),
            row.department_label.clone(),
        ])
        .map_err(render_error)?;
    }

    writer.into_inner().map_err(render_error)
}

fn render_error(e: impl std::fmt::Display) -> AppError {
    AppError::Render(e.to_string())
}
