use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 服务层错误
///
/// 数据质量问题 (坏行/未知品番/非法数值) 不在这里: 引擎只做分类, 不报错。
/// 这里只有协作方的结构性失败。
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Session {0} not found")]
    SessionNotFound(u64),

    #[error("Sheet {sheet} not found in session {session}")]
    SheetNotFound { session: u64, sheet: u64 },

    #[error("Row {row} not found in sheet {sheet}")]
    RowNotFound { sheet: u64, row: usize },

    /// 请求体 JSON 结构不对
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// OCR 返回内容无法解析为 JSON
    #[error("Extraction result is not valid JSON: {0}")]
    Extraction(#[from] serde_json::Error),

    #[error("Spreadsheet import failed: {0}")]
    Import(#[from] csv::Error),

    #[error("Report rendering failed: {0}")]
    Render(String),

    #[error("Unknown feed encoding: {0}")]
    UnknownEncoding(String),

    #[error("Unknown export table: {0}")]
    UnknownTable(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// 失败响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound(_)
            | AppError::SheetNotFound { .. }
            | AppError::RowNotFound { .. }
            | AppError::UnknownTable(_) => StatusCode::NOT_FOUND,
            AppError::InvalidPayload(_) | AppError::UnknownEncoding(_) => StatusCode::BAD_REQUEST,
            AppError::Extraction(_) | AppError::Import(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Render(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            success: false,
            message: format!("Error: {}", self),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidPayload(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
