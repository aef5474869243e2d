pub mod handlers;

pub use handlers::*;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;

use crate::service::StocktakeService;

/// 构建全部路由
pub fn router(service: Arc<StocktakeService>) -> Router {
    let body_limit = service.config().server.max_body_bytes;

    // 会话内的导入/突合/导出
    let session_routes = Router::new()
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/sessions/:id", delete(handlers::delete_session))
        .route("/api/sessions/:id/master", put(handlers::upload_master))
        .route("/api/sessions/:id/snapshot", put(handlers::upload_snapshot))
        .route("/api/sessions/:id/ocr", post(handlers::ingest_ocr))
        .route("/api/sessions/:id/import", post(handlers::ingest_import))
        .route("/api/sessions/:id/import/csv", post(handlers::ingest_import_csv))
        .route("/api/sessions/:id/sheets", get(handlers::list_sheets))
        .route(
            "/api/sessions/:id/sheets/:sheet_id",
            get(handlers::get_sheet).delete(handlers::delete_sheet),
        )
        .route(
            "/api/sessions/:id/sheets/:sheet_id/rows/:row",
            patch(handlers::update_row).delete(handlers::delete_row),
        )
        .route("/api/sessions/:id/report", get(handlers::get_report))
        .route("/api/sessions/:id/export/:table", get(handlers::export_table))
        .route("/api/reconcile", post(handlers::reconcile))
        .with_state(service);

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(session_routes)
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(body_limit)))
}
