use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use stocktake_recon::{api, AppConfig, StocktakeService};

fn app_with(config: AppConfig) -> Router {
    api::router(Arc::new(StocktakeService::new(config)))
}

fn app() -> Router {
    let mut config = AppConfig::default();
    config.feed.encoding = "UTF-8".into();
    app_with(config)
}

fn master_line(code: &str, name: &str, price: &str) -> String {
    let mut cols = vec![String::new(); 43];
    cols[0] = code.into();
    cols[1] = name.into();
    cols[18] = "W1".into();
    cols[34] = price.into();
    cols.join("\t")
}

fn snapshot_line(code: &str, qty: &str) -> String {
    let mut cols = vec![String::new(); 19];
    cols[2] = code.into();
    cols[11] = qty.into();
    cols.join("\t")
}

async fn send(app: &Router, method: Method, uri: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
    let req = Request::builder().method(method).uri(uri).body(body.into()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn new_session(app: &Router) -> u64 {
    let (status, body) = send_json(app, Method::POST, "/api/sessions", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_u64().unwrap()
}

#[tokio::test]
async fn health() {
    let (status, body) = send(&app(), Method::GET, "/health", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn full_session_flow() {
    let app = app();
    let id = new_session(&app).await;

    let master = [
        master_line("A1", "Widget", "100"),
        master_line("12", "文具", ""),
        master_line("B2", "Gadget", "1,000"),
    ]
    .join("\r\n");
    let (status, body) = send_json(&app, Method::PUT, &format!("/api/sessions/{id}/master"), master).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let snapshot = [snapshot_line("A1", "10"), snapshot_line("b2", "4")].join("\n");
    let (status, body) = send_json(&app, Method::PUT, &format!("/api/sessions/{id}/snapshot"), snapshot).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let ocr = "```json\n{\"header\":{\"部門\":\"文具\"},\"items\":[{\"品番\":\"a1\",\"数量\":7},{\"品番\":\"ZZZ\",\"数量\":5,\"備考\":\"汚れ\"},{\"数量\":3}]}\n```";
    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/ocr?file_name=scan1.pdf"),
        ocr,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "1");
    assert_eq!(body["rows"], 3);
    assert_eq!(body["unmatched"], 1);

    let import = json!({"sheet_name": "【合計】", "items": [{"code": "B2", "quantity": 3}, {"code": "b2", "quantity": 4}]});
    let req = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/sessions/{id}/import?file_name=ec.xlsx"))
        .header("content-type", "application/json")
        .body(Body::from(import.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, report) = send_json(&app, Method::GET, &format!("/api/sessions/{id}/report"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);

    let rows = report["variance"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["code"], "A1");
    assert_eq!(rows[0]["book_quantity"], 10.0);
    assert_eq!(rows[0]["physical_quantity"], 7.0);
    assert_eq!(rows[0]["variance_value"], -300);
    // 在庫一覧 的 "b2" 与 商品マスタ 的 "B2" 不匹配
    assert_eq!(rows[1]["book_quantity"], 0.0);
    assert_eq!(rows[1]["physical_quantity"], 7.0);
    assert_eq!(rows[1]["variance_value"], 7000);

    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["code"], "ZZZ");
    assert_eq!(errors[0]["note"], "汚れ");
    assert_eq!(report["summary"], json!({"total_rows": 2, "variance_rows": 2, "unmatched": 1}));
}

#[tokio::test]
async fn export_csv_with_summary_headers() {
    let app = app();
    let id = new_session(&app).await;
    send(&app, Method::PUT, &format!("/api/sessions/{id}/master"), master_line("A1", "Widget", "100")).await;
    send(&app, Method::POST, &format!("/api/sessions/{id}/import/csv"), "SKU,数量\nA1,2\nQQ,1\n").await;

    let req = Request::builder()
        .uri(format!("/api/sessions/{id}/export/variance"))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers().clone();
    assert_eq!(headers["x-summary-total"], "1");
    assert_eq!(headers["x-summary-diff"], "1");
    assert_eq!(headers["x-summary-errors"], "1");
    assert!(headers["content-disposition"].to_str().unwrap().contains("variance.csv"));

    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(
        text,
        "品番,商品名,倉庫コード,単価,やよい在庫,実地棚卸数,差分,差分金額\nA1,Widget,W1,100,0,2,2,200\n"
    );

    let (status, body) = send(&app, Method::GET, &format!("/api/sessions/{id}/export/errors"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "品番,数量,備考,シートNo,部門\nQQ,1,,Excel,EC\n");
}

#[tokio::test]
async fn shift_jis_master_upload() {
    let app = app_with(AppConfig::default());
    let id = new_session(&app).await;

    // "商品A" in Shift_JIS
    let mut line: Vec<u8> = b"A1\t".to_vec();
    line.extend_from_slice(b"\x8f\xa4\x95iA");
    line.extend_from_slice("\t".repeat(33).as_bytes());
    line.extend_from_slice(b"500\r\n");

    let (status, body) = send_json(&app, Method::PUT, &format!("/api/sessions/{id}/master"), line).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (_, report) = send_json(&app, Method::GET, &format!("/api/sessions/{id}/report"), Body::empty()).await;
    assert_eq!(report["variance"][0]["name"], "商品A");
    assert_eq!(report["variance"][0]["unit_price"], 500.0);
}

#[tokio::test]
async fn structural_failures() {
    let app = app();

    let (status, body) = send_json(&app, Method::GET, "/api/sessions/999/report", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("999"));

    let id = new_session(&app).await;
    let (status, body) = send_json(&app, Method::POST, &format!("/api/sessions/{id}/ocr"), "申し訳ありません").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);

    let (status, _) = send_json(&app, Method::GET, &format!("/api/sessions/{id}/export/summary"), Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, Method::DELETE, &format!("/api/sessions/{id}"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send_json(&app, Method::GET, &format!("/api/sessions/{id}/sheets"), Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stateless_reconcile() {
    let app = app();
    let req = json!({
        "product_master": [{"code": "A1", "name": "Widget", "warehouse_code": "W1", "unit_price": 3.0}],
        "snapshot": [{"code": "A1", "book_quantity": 1.5}],
        "observations": [{"code": "zzz", "quantity": 1.0, "source_label": "7", "department_label": "EC"}, {"quantity": 2.0}]
    });
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/reconcile")
        .header("content-type", "application/json")
        .body(Body::from(req.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let report: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["variance"][0]["variance"], -1.5);
    assert_eq!(report["variance"][0]["variance_value"], -5);
    assert_eq!(report["errors"].as_array().unwrap().len(), 1);
    assert_eq!(report["summary"]["unmatched"], 1);
}

async fn send_body(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn sheet_and_row_review() {
    let app = app();
    let id = new_session(&app).await;
    send(&app, Method::PUT, &format!("/api/sessions/{id}/master"), master_line("A1", "Widget", "100")).await;

    let ocr = r#"{"items":[{"品番":"Al","数量":2},{"品番":"NOISE","数量":9}]}"#;
    let (_, first) = send_json(&app, Method::POST, &format!("/api/sessions/{id}/ocr"), ocr).await;
    let (_, second) = send_json(&app, Method::POST, &format!("/api/sessions/{id}/ocr"), "{}").await;
    assert_eq!(first["unmatched"], 2);
    let sheet = first["sheet_id"].as_u64().unwrap();

    // 误读的 "Al" 改成 "A1", 多余的行删掉
    let (status, row) = send_body(
        &app,
        Method::PATCH,
        &format!("/api/sessions/{id}/sheets/{sheet}/rows/0"),
        json!({"code": "A1", "note": "修正"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["code"], "A1");
    assert_eq!(row["quantity"], 2.0);

    let (status, row) = send_json(&app, Method::DELETE, &format!("/api/sessions/{id}/sheets/{sheet}/rows/1"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["code"], "NOISE");

    let (status, detail) = send_json(&app, Method::GET, &format!("/api/sessions/{id}/sheets/{sheet}"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["observations"].as_array().unwrap().len(), 1);
    assert_eq!(detail["observations"][0]["note"], "修正");

    let (_, report) = send_json(&app, Method::GET, &format!("/api/sessions/{id}/report"), Body::empty()).await;
    assert_eq!(report["variance"][0]["physical_quantity"], 2.0);
    assert_eq!(report["summary"]["unmatched"], 0);

    // 删除表后占位シートNo 不回收
    let second_id = second["sheet_id"].as_u64().unwrap();
    let (status, _) = send_json(&app, Method::DELETE, &format!("/api/sessions/{id}/sheets/{second_id}"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let (_, third) = send_json(&app, Method::POST, &format!("/api/sessions/{id}/ocr"), "{}").await;
    assert_eq!(third["label"], "3");

    let (status, body) = send_json(&app, Method::DELETE, &format!("/api/sessions/{id}/sheets/{second_id}"), Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    let (status, _) = send_json(&app, Method::DELETE, &format!("/api/sessions/{id}/sheets/{sheet}/rows/5"), Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_bodies_use_the_error_envelope() {
    let app = app();
    let id = new_session(&app).await;

    // items[0] 缺少 code
    let (status, body) = send_body(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/import"),
        json!({"items": [{"quantity": 1}]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Error: Invalid payload"));

    let (status, body) = send_body(&app, Method::POST, "/api/reconcile", json!({"observations": "none"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send_json(&app, Method::POST, "/api/reconcile", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, sheets) = send_json(&app, Method::GET, &format!("/api/sessions/{id}/sheets"), Body::empty()).await;
    assert!(sheets.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn two_column_master_lines_are_products() {
    let app = app();
    let id = new_session(&app).await;

    let (status, body) = send_json(&app, Method::PUT, &format!("/api/sessions/{id}/master"), "A1\tWidget\r\n").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    send(&app, Method::POST, &format!("/api/sessions/{id}/import/csv"), "SKU,数量\na1,3\n").await;
    let (_, report) = send_json(&app, Method::GET, &format!("/api/sessions/{id}/report"), Body::empty()).await;
    assert_eq!(report["variance"][0]["code"], "A1");
    assert_eq!(report["variance"][0]["unit_price"], 0.0);
    assert_eq!(report["variance"][0]["physical_quantity"], 3.0);
    assert!(report["errors"].as_array().unwrap().is_empty());
}
