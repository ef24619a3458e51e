use serde::{Deserialize, Serialize};

/// 默认压缩上限 900KB (与前端一致)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 900 * 1024;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub compression: CompressionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// multipart 上传体积上限
    pub max_upload_bytes: usize,
}

/// OCR.space 接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    pub api_url: String,
    pub api_key: String,
    pub language: String,
    pub engine: u8,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub max_size_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                max_upload_bytes: 20 * 1024 * 1024,
            },
            ocr: OcrConfig {
                api_url: "https://api.ocr.space/parse/image".to_string(),
                api_key: "helloworld".to_string(),
                language: "eng".to_string(),
                engine: 2,
                timeout_secs: 60,
            },
            compression: CompressionConfig {
                max_size_bytes: DEFAULT_MAX_IMAGE_BYTES,
            },
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置
    ///
    /// 变量以 `LINEN_` 为前缀, `__` 分隔层级, 例如 `LINEN_SERVER__PORT=9000`、
    /// `LINEN_OCR__API_KEY=...`。未设置的项使用默认值。
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::builder()?
            .add_source(
                config::Environment::with_prefix("LINEN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.max_upload_bytes", defaults.server.max_upload_bytes as i64)?
            .set_default("ocr.api_url", defaults.ocr.api_url)?
            .set_default("ocr.api_key", defaults.ocr.api_key)?
            .set_default("ocr.language", defaults.ocr.language)?
            .set_default("ocr.engine", i64::from(defaults.ocr.engine))?
            .set_default("ocr.timeout_secs", defaults.ocr.timeout_secs as i64)?
            .set_default("compression.max_size_bytes", defaults.compression.max_size_bytes as i64)
    }
}
