use crate::db::{HistoryStore, UsageTracker};
use crate::models::{InventoryRecord, NewExtraction};
use crate::service::compressor::{CompressError, CompressionStats, ImageCompressor};
use crate::service::ocr::{OcrError, OcrProvider};
use crate::service::parser::parse_inventory;
use axum::http::StatusCode;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Compress(#[from] CompressError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("compression task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ExtractError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExtractError::Compress(CompressError::ImageDecode(_)) => StatusCode::BAD_REQUEST,
            ExtractError::Ocr(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 上传的盘点单图片
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub file: Vec<u8>,
    pub filename: String,
    pub hotel_id: String,
    pub hotel_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub data: InventoryRecord,
    pub raw_text: String,
    pub history_id: String,
    pub compression: CompressionStats,
}

/// 提取服务: 压缩 -> OCR -> 解析 -> 记录用量与历史
pub struct ExtractionService {
    compressor: ImageCompressor,
    ocr: Arc<dyn OcrProvider>,
    history: HistoryStore,
    usage: UsageTracker,
}

impl ExtractionService {
    pub fn new(
        compressor: ImageCompressor,
        ocr: Arc<dyn OcrProvider>,
        history: HistoryStore,
        usage: UsageTracker,
    ) -> Self {
        Self {
            compressor,
            ocr,
            history,
            usage,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub async fn extract(&self, req: ExtractionRequest) -> Result<ExtractionOutcome, ExtractError> {
        let ExtractionRequest {
            file,
            filename,
            hotel_id,
            hotel_name,
        } = req;

        tracing::info!(
            "Extracting {} for hotel {} ({} bytes)",
            filename, hotel_id, file.len()
        );

        // 1. 压缩 (CPU 密集, 放到 blocking 线程池)
        let compressor = self.compressor;
        let compressed = tokio::task::spawn_blocking(move || compressor.compress(&file)).await??;

        // 压缩后统一为 JPEG, 文件名扩展名随之修改
        let upload_name = if compressed.stats.was_compressed() {
            Path::new(&filename)
                .with_extension("jpg")
                .to_string_lossy()
                .into_owned()
        } else {
            filename.clone()
        };

        // 2. OCR
        let raw_text = match self.ocr.recognize(compressed.data, &upload_name).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("OCR failed for {}: {}", filename, e);
                return Err(e.into());
            }
        };

        // 3. 解析
        let data = parse_inventory(&raw_text);
        tracing::info!(
            "Extraction parsed: {} linen, {} uniform items",
            data.linen_items.len(),
            data.uniform_items.len()
        );

        // 4. 用量与历史
        self.usage.increment();
        let entry = self.history.save(NewExtraction {
            hotel_id,
            hotel_name,
            filename,
            data: data.clone(),
            raw_text: raw_text.clone(),
        });

        Ok(ExtractionOutcome {
            data,
            raw_text,
            history_id: entry.id,
            compression: compressed.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// 记录收到的文件名, 返回固定文本
    struct FakeOcr {
        text: Result<String, String>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OcrProvider for FakeOcr {
        async fn recognize(&self, _image: Vec<u8>, filename: &str) -> Result<String, OcrError> {
            self.seen.lock().push(filename.to_string());
            self.text.clone().map_err(OcrError::Api)
        }
    }

    fn service(text: Result<String, String>) -> (ExtractionService, Arc<FakeOcr>) {
        let ocr = Arc::new(FakeOcr {
            text,
            seen: Mutex::new(Vec::new()),
        });
        let svc = ExtractionService::new(
            ImageCompressor::new(1024),
            ocr.clone(),
            HistoryStore::new(),
            UsageTracker::new(),
        );
        (svc, ocr)
    }

    fn request(file: Vec<u8>) -> ExtractionRequest {
        ExtractionRequest {
            file,
            filename: "sheet.png".to_string(),
            hotel_id: "HTL-1".to_string(),
            hotel_name: Some("Grand".to_string()),
        }
    }

    #[tokio::test]
    async fn extract_records_history_and_usage() {
        let (svc, ocr) = service(Ok("Towel 10 5 12 2 13\nChef Coat 3 1 4 0 4".to_string()));

        let outcome = svc.extract(request(b"tiny".to_vec())).await.unwrap();

        assert_eq!(outcome.data.linen_items.len(), 1);
        assert_eq!(outcome.data.uniform_items.len(), 1);
        assert!(!outcome.compression.was_compressed());
        assert_eq!(ocr.seen.lock().as_slice(), ["sheet.png"]);

        let entry = svc.history().get(&outcome.history_id).unwrap();
        assert_eq!(entry.linen_count, 1);
        assert_eq!(entry.uniform_count, 1);
        assert_eq!(entry.hotel_name.as_deref(), Some("Grand"));
        assert_eq!(svc.usage().stats().total_count, 1);
    }

    #[tokio::test]
    async fn ocr_failure_is_not_recorded() {
        let (svc, _) = service(Err("Invalid API key".to_string()));

        let err = svc.extract(request(b"tiny".to_vec())).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Invalid API key");
        assert!(svc.history().is_empty());
        assert_eq!(svc.usage().stats().total_count, 0);
    }

    #[tokio::test]
    async fn undecodable_oversized_upload_is_bad_request() {
        let (svc, ocr) = service(Ok(String::new()));

        let err = svc.extract(request(vec![0u8; 4096])).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(ocr.seen.lock().is_empty());
    }
}
