use crate::db::{HistoryStore, UsageTracker};
use crate::models::{HistoryPage, HistoryQuery, InventoryRecord, UsageStats};
use crate::service::{
    export_csv, export_json, parse_inventory, CompressionStats, ExtractionRequest, ExtractionService,
};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Json, Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    fn error(status: StatusCode, message: impl Into<String>) -> Response {
        let body = MessageResponse {
            success: false,
            message: message.into(),
        };
        (status, Json(body)).into_response()
    }

    /// 提取器拒绝 (请求体/查询参数格式错误) 也统一为 JSON
    fn rejection(status: StatusCode, message: String) -> Response {
        tracing::warn!("Rejected request ({}): {}", status, message);
        Self::error(status, message)
    }
}

/// 提取响应体
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub message: String,
    pub data: InventoryRecord,
    pub raw_text: String,
    pub history_id: String,
    pub compression: CompressionStats,
}

/// 请求体: OCR 原始文本
#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub raw_text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub success: bool,
    pub data: InventoryRecord,
}

/// 请求体: 导出 (可能已被用户修改过的) 盘点记录
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub data: InventoryRecord,
    pub hotel_name: Option<String>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 上传图片并提取盘点数据
///
/// multipart 字段: `file` (图片), `hotel_id`, `hotel_name` (可选)
pub async fn extract(
    State(service): State<Arc<ExtractionService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => return MessageResponse::rejection(rejection.status(), rejection.body_text()),
    };
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut hotel_id: Option<String> = None;
    let mut hotel_name: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read multipart field: {}", e);
                return multipart_error(e);
            }
        };

        let name = field.name().unwrap_or("").to_string();
        let result = match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload.jpg".to_string());
                field.bytes().await.map(|b| file = Some((filename, b.to_vec())))
            }
            "hotel_id" => field.text().await.map(|t| hotel_id = Some(t)),
            "hotel_name" => field.text().await.map(|t| hotel_name = Some(t)),
            _ => {
                tracing::debug!("Ignoring multipart field '{}'", name);
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::error!("Failed to read field '{}': {}", name, e);
            return multipart_error(e);
        }
    }

    let Some(hotel_id) = hotel_id.filter(|h| !h.trim().is_empty()) else {
        return MessageResponse::error(StatusCode::BAD_REQUEST, "Please select a hotel first");
    };
    let Some((filename, bytes)) = file.filter(|(_, b)| !b.is_empty()) else {
        return MessageResponse::error(StatusCode::BAD_REQUEST, "Please select an image first");
    };

    let request = ExtractionRequest {
        file: bytes,
        filename,
        hotel_id,
        hotel_name: hotel_name.filter(|n| !n.is_empty()),
    };

    match service.extract(request).await {
        Ok(outcome) => {
            let response = ExtractResponse {
                success: true,
                message: format!(
                    "Extracted {} linen and {} uniform items",
                    outcome.data.linen_items.len(),
                    outcome.data.uniform_items.len()
                ),
                data: outcome.data,
                raw_text: outcome.raw_text,
                history_id: outcome.history_id,
                compression: outcome.compression,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => MessageResponse::error(e.status_code(), format!("Error: {}", e)),
    }
}

/// 直接解析 OCR 文本
pub async fn parse(payload: Result<Json<ParseRequest>, JsonRejection>) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return MessageResponse::rejection(rejection.status(), rejection.body_text()),
    };

    Json(ParseResponse {
        success: true,
        data: parse_inventory(&req.raw_text),
    })
    .into_response()
}

/// 导出 CSV 报表
pub async fn export(payload: Result<Json<ExportRequest>, JsonRejection>) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return MessageResponse::rejection(rejection.status(), rejection.body_text()),
    };

    match export_csv(&req.data) {
        Ok(csv) => attachment(
            "text/csv; charset=utf-8",
            export_filename(req.hotel_name.as_deref(), "csv"),
            csv,
        ),
        Err(e) => {
            tracing::error!("CSV export failed: {}", e);
            MessageResponse::error(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
        }
    }
}

/// 导出 JSON 文件
pub async fn export_json_file(payload: Result<Json<ExportRequest>, JsonRejection>) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return MessageResponse::rejection(rejection.status(), rejection.body_text()),
    };

    match export_json(&req.data) {
        Ok(json) => attachment(
            "application/json",
            export_filename(req.hotel_name.as_deref(), "json"),
            json,
        ),
        Err(e) => {
            tracing::error!("JSON export failed: {}", e);
            MessageResponse::error(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
        }
    }
}

/// 历史列表
pub async fn list_history(
    State(history): State<HistoryStore>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(query)) => Json::<HistoryPage>(history.list(&query)).into_response(),
        Err(rejection) => MessageResponse::rejection(rejection.status(), rejection.body_text()),
    }
}

pub async fn get_history(State(history): State<HistoryStore>, Path(id): Path<String>) -> Response {
    match history.get(&id) {
        Some(entry) => (StatusCode::OK, Json(entry)).into_response(),
        None => MessageResponse::error(StatusCode::NOT_FOUND, "History item not found"),
    }
}

pub async fn delete_history(State(history): State<HistoryStore>, Path(id): Path<String>) -> Response {
    if history.delete(&id) {
        let response = MessageResponse {
            success: true,
            message: format!("Deleted {}", id),
        };
        (StatusCode::OK, Json(response)).into_response()
    } else {
        MessageResponse::error(StatusCode::NOT_FOUND, "History item not found")
    }
}

/// OCR 用量
pub async fn usage_stats(State(usage): State<UsageTracker>) -> Json<UsageStats> {
    Json(usage.stats())
}

pub async fn reset_usage(State(usage): State<UsageTracker>) -> Json<UsageStats> {
    tracing::info!("Usage counters reset");
    Json(usage.reset())
}

/// 上传超过 body 上限时 multer 报错, status() 为 413
fn multipart_error(e: MultipartError) -> Response {
    MessageResponse::error(e.status(), format!("Error: {}", e.body_text()))
}

fn attachment(content_type: &'static str, filename: String, body: String) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// extraction_{酒店}_{毫秒时间戳}.{扩展名}
fn export_filename(hotel_name: Option<&str>, extension: &str) -> String {
    let hotel = hotel_name
        .map(sanitize_filename)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "data".to_string());
    format!(
        "extraction_{}_{}.{}",
        hotel,
        chrono::Utc::now().timestamp_millis(),
        extension
    )
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
