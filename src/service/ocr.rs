use crate::config::OcrConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OCR service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Api(String),

    #[error("invalid OCR response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// OCR 服务: 输入图片, 返回识别文本
#[async_trait]
pub trait OcrProvider: Send + Sync {
    async fn recognize(&self, image: Vec<u8>, filename: &str) -> Result<String, OcrError>;
}

/// OCR.space parse/image 响应
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(rename = "OCRExitCode", default)]
    ocr_exit_code: i64,
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
    /// 可能是字符串也可能是字符串数组
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: Option<String>,
}

impl OcrSpaceResponse {
    /// OCRExitCode == 1 视为成功, 取第一页文本
    fn into_text(self) -> Result<String, OcrError> {
        if self.ocr_exit_code != 1 {
            let message = match self.error_message {
                Some(serde_json::Value::String(s)) if !s.is_empty() => s,
                Some(serde_json::Value::Array(items)) if !items.is_empty() => items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
                _ => "OCR failed".to_string(),
            };
            return Err(OcrError::Api(message));
        }

        Ok(self
            .parsed_results
            .into_iter()
            .flatten()
            .next()
            .and_then(|r| r.parsed_text)
            .unwrap_or_default())
    }
}

/// OCR.space 客户端
pub struct OcrSpaceClient {
    client: reqwest::Client,
    config: OcrConfig,
}

impl OcrSpaceClient {
    pub fn new(config: OcrConfig) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl OcrProvider for OcrSpaceClient {
    async fn recognize(&self, image: Vec<u8>, filename: &str) -> Result<String, OcrError> {
        let mime = image::guess_format(&image)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        let size = image.len();

        let part = Part::bytes(image)
            .file_name(filename.to_string())
            .mime_str(mime)?;
        let form = Form::new()
            .part("file", part)
            .text("apikey", self.config.api_key.clone())
            .text("language", self.config.language.clone())
            .text("isOverlayRequired", "false")
            .text("detectOrientation", "true")
            .text("scale", "true")
            .text("OCREngine", self.config.engine.to_string());

        tracing::info!("[OCR] Uploading {} ({} bytes, {})", filename, size, mime);
        let resp = self
            .client
            .post(&self.config.api_url)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            tracing::error!("[OCR] HTTP {}: {}", status, body);
            return Err(OcrError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OcrSpaceResponse = serde_json::from_str(&body)?;
        let text = parsed.into_text()?;
        tracing::info!("[OCR] Recognized {} characters", text.chars().count());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> OcrSpaceResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn success_returns_first_page_text() {
        let resp = response(
            r#"{"ParsedResults":[{"ParsedText":"Towel 1 2\r\n"},{"ParsedText":"ignored"}],"OCRExitCode":1,"IsErroredOnProcessing":false}"#,
        );
        assert_eq!(resp.into_text().unwrap(), "Towel 1 2\r\n");
    }

    #[test]
    fn success_without_results_is_empty_text() {
        let resp = response(r#"{"OCRExitCode":1,"ParsedResults":null}"#);
        assert_eq!(resp.into_text().unwrap(), "");
    }

    #[test]
    fn error_message_array_is_joined() {
        let resp = response(
            r#"{"OCRExitCode":3,"IsErroredOnProcessing":true,"ErrorMessage":["File too large","Try again"]}"#,
        );
        let err = resp.into_text().unwrap_err();
        assert_eq!(err.to_string(), "File too large; Try again");
    }

    #[test]
    fn error_message_string_or_default() {
        let resp = response(r#"{"OCRExitCode":99,"ErrorMessage":"Invalid API key"}"#);
        assert_eq!(resp.into_text().unwrap_err().to_string(), "Invalid API key");

        let resp = response(r#"{"OCRExitCode":4}"#);
        assert_eq!(resp.into_text().unwrap_err().to_string(), "OCR failed");
    }
}
