use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::InventoryRecord;

/// 提取历史记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionEntry {
    pub id: String,
    pub hotel_id: String,
    pub hotel_name: Option<String>,
    pub filename: String,
    #[serde(flatten)]
    pub data: InventoryRecord,
    pub linen_count: usize,
    pub uniform_count: usize,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

/// 新建历史记录所需字段
#[derive(Debug, Clone)]
pub struct NewExtraction {
    pub hotel_id: String,
    pub hotel_name: Option<String>,
    pub filename: String,
    pub data: InventoryRecord,
    pub raw_text: String,
}

/// 历史查询条件 (日期为闭区间)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub hotel_id: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl HistoryQuery {
    pub fn matches(&self, entry: &ExtractionEntry) -> bool {
        if let Some(hotel_id) = &self.hotel_id {
            if &entry.hotel_id != hotel_id {
                return false;
            }
        }
        let day = entry.created_at.date_naive();
        if self.from_date.is_some_and(|from| day < from) {
            return false;
        }
        if self.to_date.is_some_and(|to| day > to) {
            return false;
        }
        true
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub history: Vec<ExtractionEntry>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}
