use std::str::FromStr;
use std::sync::Arc;
use stocktake_recon::{api, AppConfig, StocktakeService};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载配置
    let config = AppConfig::load()?;

    // 初始化日志 - 使用本地时间格式
    let level = tracing::Level::from_str(&config.log.level).unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_max_level(level)
        .init();

    info!("Starting server with config: {:?}", config);

    // 会话存储与突合引擎
    let addr = config.bind_addr();
    let ttl_secs = config.server.session_ttl_secs;
    let sweep_secs = config.server.sweep_interval_secs.max(1);
    let service = Arc::new(StocktakeService::new(config));

    // 定期清理空闲会话
    if ttl_secs > 0 {
        let sweeper = service.clone();
        let ttl = chrono::Duration::seconds(ttl_secs.min(i64::MAX as u64 / 1000) as i64);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(sweep_secs));
            loop {
                ticker.tick().await;
                let expired = sweeper.expire_idle_sessions(ttl);
                if expired > 0 {
                    info!("Expired {} idle sessions, {} remaining", expired, sweeper.session_count());
                }
            }
        });
    }

    let app = api::router(service);

    // 启动服务器
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/sessions                       - 新建棚卸会话");
    info!("  PUT  /api/sessions/:id/master            - 上传 商品マスタ");
    info!("  PUT  /api/sessions/:id/snapshot          - 上传 在庫一覧");
    info!("  POST /api/sessions/:id/ocr               - 提交 OCR 结果");
    info!("  POST /api/sessions/:id/import[/csv]      - 提交 EC 表格");
    info!("  GET  /api/sessions/:id/sheets[/:sheet]   - 表概要 / 单表明细");
    info!("  DEL  /api/sessions/:id/sheets/:sheet     - 删除表");
    info!("  PATCH|DEL .../sheets/:sheet/rows/:row    - 修改 / 删除行");
    info!("  GET  /api/sessions/:id/report            - 突合结果");
    info!("  GET  /api/sessions/:id/export/:table     - 导出 CSV (variance|errors)");
    info!("  POST /api/reconcile                      - 无会话突合");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
