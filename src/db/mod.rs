pub mod history;
pub mod usage;

pub use history::HistoryStore;
pub use usage::UsageTracker;
