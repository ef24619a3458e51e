pub mod handlers;

pub use handlers::*;

use crate::service::ExtractionService;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// 构建路由
pub fn router(service: Arc<ExtractionService>, max_upload_bytes: usize) -> Router {
    let extract_routes = Router::new()
        .route("/api/extract", post(handlers::extract))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service.clone());

    let history_routes = Router::new()
        .route("/api/history", get(handlers::list_history))
        .route(
            "/api/history/:id",
            get(handlers::get_history).delete(handlers::delete_history),
        )
        .with_state(service.history().clone());

    let usage_routes = Router::new()
        .route("/api/usage", get(handlers::usage_stats))
        .route("/api/usage/reset", post(handlers::reset_usage))
        .with_state(service.usage().clone());

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/parse", post(handlers::parse))
        .route("/api/export/csv", post(handlers::export))
        .route("/api/export/json", post(handlers::export_json_file))
        .merge(extract_routes)
        .merge(history_routes)
        .merge(usage_routes)
}
