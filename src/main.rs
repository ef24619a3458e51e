use linen_ocr_rust::{api, AppConfig, ExtractionService, HistoryStore, ImageCompressor, OcrSpaceClient, UsageTracker};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!(
        "Starting server: {}:{}, OCR endpoint {}, image ceiling {} bytes",
        config.server.host, config.server.port, config.ocr.api_url, config.compression.max_size_bytes
    );

    // 创建提取服务
    let ocr = Arc::new(OcrSpaceClient::new(config.ocr.clone())?);
    let service = Arc::new(ExtractionService::new(
        ImageCompressor::new(config.compression.max_size_bytes),
        ocr,
        HistoryStore::new(),
        UsageTracker::new(),
    ));

    let app = api::router(service, config.server.max_upload_bytes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/extract          - Upload an inventory sheet image");
    info!("  POST /api/parse            - Parse raw OCR text");
    info!("  POST /api/export/csv       - Export record as CSV");
    info!("  POST /api/export/json      - Export record as JSON");
    info!("  GET  /api/history[/:id]    - Extraction history");
    info!("  GET  /api/usage            - OCR usage counters");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
