use crate::error::AppResult;
use crate::export::{self, ExportTable};
use crate::models::{
    CountSheet, InventorySnapshotEntry, Observation, ProductMasterEntry, ReconReport, RowUpdate,
    SheetSummary, SpreadsheetImport,
};
use crate::service::{self, StocktakeService};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 通用响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct BasicResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: u64,
}

/// 主数据上传响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedUploadResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
}

/// 上传文件名 (仅用于记录来源)
#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    #[serde(default)]
    pub file_name: Option<String>,
}

impl FileQuery {
    fn name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("")
    }
}

/// 无会话突合请求体
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReconcileRequest {
    #[serde(default)]
    pub product_master: Vec<ProductMasterEntry>,
    #[serde(default)]
    pub snapshot: Vec<InventorySnapshotEntry>,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn create_session(State(service): State<Arc<StocktakeService>>) -> Json<CreateSessionResponse> {
    let session_id = service.create_session();
    Json(CreateSessionResponse { success: true, session_id })
}

pub async fn delete_session(
    State(service): State<Arc<StocktakeService>>,
    Path(id): Path<u64>,
) -> AppResult<Json<BasicResponse>> {
    service.delete_session(id)?;
    Ok(Json(BasicResponse {
        success: true,
        message: format!("Session {} deleted", id),
    }))
}

/// 上传 商品マスタ (原始字节, 按配置编码解码)
pub async fn upload_master(
    State(service): State<Arc<StocktakeService>>,
    Path(id): Path<u64>,
    body: Bytes,
) -> AppResult<Json<FeedUploadResponse>> {
    let count = service.load_product_master(id, &body)?;
    Ok(Json(FeedUploadResponse {
        success: true,
        message: format!("商品マスタ: {}件", count),
        count,
    }))
}

/// 上传 在庫一覧
pub async fn upload_snapshot(
    State(service): State<Arc<StocktakeService>>,
    Path(id): Path<u64>,
    body: Bytes,
) -> AppResult<Json<FeedUploadResponse>> {
    let count = service.load_inventory_snapshot(id, &body)?;
    Ok(Json(FeedUploadResponse {
        success: true,
        message: format!("在庫一覧: {}件", count),
        count,
    }))
}

/// 提交 OCR 服务返回的文本
pub async fn ingest_ocr(
    State(service): State<Arc<StocktakeService>>,
    Path(id): Path<u64>,
    Query(query): Query<FileQuery>,
    body: String,
) -> AppResult<Json<SheetSummary>> {
    let summary = service.ingest_extraction(id, query.name(), &body)?;
    Ok(Json(summary))
}

/// 提交 EC 表格解析结果
pub async fn ingest_import(
    State(service): State<Arc<StocktakeService>>,
    Path(id): Path<u64>,
    Query(query): Query<FileQuery>,
    payload: Result<Json<SpreadsheetImport>, JsonRejection>,
) -> AppResult<Json<SheetSummary>> {
    let Json(import) = payload?;
    let summary = service.ingest_import(id, query.name(), import)?;
    Ok(Json(summary))
}

/// 提交 EC 表格导出的 CSV
pub async fn ingest_import_csv(
    State(service): State<Arc<StocktakeService>>,
    Path(id): Path<u64>,
    Query(query): Query<FileQuery>,
    body: String,
) -> AppResult<Json<SheetSummary>> {
    let summary = service.ingest_import_csv(id, query.name(), &body)?;
    Ok(Json(summary))
}

pub async fn list_sheets(
    State(service): State<Arc<StocktakeService>>,
    Path(id): Path<u64>,
) -> AppResult<Json<Vec<SheetSummary>>> {
    Ok(Json(service.sheets(id)?))
}

/// 单张表的全部行
pub async fn get_sheet(
    State(service): State<Arc<StocktakeService>>,
    Path((id, sheet_id)): Path<(u64, u64)>,
) -> AppResult<Json<CountSheet>> {
    Ok(Json(service.sheet(id, sheet_id)?))
}

pub async fn delete_sheet(
    State(service): State<Arc<StocktakeService>>,
    Path((id, sheet_id)): Path<(u64, u64)>,
) -> AppResult<Json<BasicResponse>> {
    service.delete_sheet(id, sheet_id)?;
    Ok(Json(BasicResponse {
        success: true,
        message: format!("Sheet {} deleted", sheet_id),
    }))
}

/// 审核时修改一行 (品番/数量/備考)
pub async fn update_row(
    State(service): State<Arc<StocktakeService>>,
    Path((id, sheet_id, row)): Path<(u64, u64, usize)>,
    payload: Result<Json<RowUpdate>, JsonRejection>,
) -> AppResult<Json<Observation>> {
    let Json(update) = payload?;
    Ok(Json(service.update_row(id, sheet_id, row, update)?))
}

pub async fn delete_row(
    State(service): State<Arc<StocktakeService>>,
    Path((id, sheet_id, row)): Path<(u64, u64, usize)>,
) -> AppResult<Json<Observation>> {
    Ok(Json(service.delete_row(id, sheet_id, row)?))
}

/// 突合结果 (JSON)
pub async fn get_report(
    State(service): State<Arc<StocktakeService>>,
    Path(id): Path<u64>,
) -> AppResult<Json<ReconReport>> {
    Ok(Json(service.reconcile(id)?))
}

/// 导出 CSV, 统计数放在响应头里
pub async fn export_table(
    State(service): State<Arc<StocktakeService>>,
    Path((id, table)): Path<(u64, String)>,
) -> AppResult<Response> {
    let table: ExportTable = table.parse()?;
    let report = service.reconcile(id)?;
    let body = export::render(&report, table)?;

    let file_name = export::export_file_name(table, chrono::Local::now().date_naive());
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        export::ascii_file_name(&file_name),
        export::percent_encode(&file_name)
    );

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
        (HeaderName::from_static("x-summary-total"), report.summary.total_rows.to_string()),
        (HeaderName::from_static("x-summary-diff"), report.summary.variance_rows.to_string()),
        (HeaderName::from_static("x-summary-errors"), report.summary.unmatched.to_string()),
    ];
    Ok((StatusCode::OK, headers, body).into_response())
}

/// 无会话突合: 一次请求带齐全部输入
pub async fn reconcile(payload: Result<Json<ReconcileRequest>, JsonRejection>) -> AppResult<Json<ReconReport>> {
    let Json(req) = payload?;
    Ok(Json(service::reconcile(&req.product_master, &req.snapshot, &req.observations)))
}
