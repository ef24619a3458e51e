pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod service;

pub use crate::config::AppConfig;
pub use db::{HistoryStore, UsageTracker};
pub use service::{ExtractionService, ImageCompressor, OcrSpaceClient};
