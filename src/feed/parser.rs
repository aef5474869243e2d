use crate::feed::ColumnLayout;
use crate::models::{InventorySnapshotEntry, ProductMasterEntry};

/// 按布局切出来的一行
#[derive(Debug, Clone, PartialEq)]
struct FeedRecord {
    code: String,
    name: String,
    warehouse: String,
    value: f64,
}

/// 解析 商品マスタ
pub fn parse_product_master(text: &str, layout: &ColumnLayout) -> Vec<ProductMasterEntry> {
    parse_feed(text, layout)
        .into_iter()
        .map(|r| ProductMasterEntry {
            code: r.code,
            name: r.name,
            warehouse_code: r.warehouse,
            unit_price: r.value,
        })
        .collect()
}

/// 解析 在庫一覧
pub fn parse_inventory_snapshot(text: &str, layout: &ColumnLayout) -> Vec<InventorySnapshotEntry> {
    parse_feed(text, layout)
        .into_iter()
        .map(|r| InventorySnapshotEntry {
            code: r.code,
            book_quantity: r.value,
        })
        .collect()
}

fn parse_feed(text: &str, layout: &ColumnLayout) -> Vec<FeedRecord> {
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for line in text.split(['\r', '\n']) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line, layout) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    tracing::debug!("Feed parsed: {} records, {} lines dropped", records.len(), dropped);
    records
}

/// 不合格的行返回 None (静默丢弃, 不是错误)
fn parse_line(line: &str, layout: &ColumnLayout) -> Option<FeedRecord> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < layout.min_columns {
        return None;
    }

    let code = column(&cols, Some(layout.code));
    if code.is_empty() {
        return None;
    }
    if layout.skip_category_codes && is_category_code(&code) {
        return None;
    }

    Some(FeedRecord {
        code,
        name: column(&cols, layout.name),
        warehouse: column(&cols, layout.warehouse),
        value: parse_number(cols.get(layout.value).copied().unwrap_or("")),
    })
}

fn column(cols: &[&str], idx: Option<usize>) -> String {
    idx.and_then(|i| cols.get(i))
        .map(|c| c.trim().to_string())
        .unwrap_or_default()
}

/// 1~4 位纯数字的品番是分类行/小计行
fn is_category_code(code: &str) -> bool {
    (1..=4).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit())
}

/// 宽松数值解析: 去掉千分位逗号, 取最长的合法数字前缀, 失败则为 0
///
/// `"1,234"` -> 1234, `"12.5円"` -> 12.5, `"abc"` -> 0
pub fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|&c| c != ',').collect();
    let s = cleaned.trim();
    let bytes = s.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }

    // 指数部分只有完整时才计入
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
