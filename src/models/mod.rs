pub mod history;
pub mod inventory;
pub mod usage;

pub use history::{ExtractionEntry, HistoryPage, HistoryQuery, NewExtraction};
pub use inventory::{InventoryHeader, InventoryRecord, LineItem};
pub use usage::UsageStats;
