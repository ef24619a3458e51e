use crate::models::{ExtractionEntry, HistoryPage, HistoryQuery, NewExtraction};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: usize = 10;

/// 提取历史 (内存存储, 进程重启后清空)
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Arc<DashMap<String, ExtractionEntry>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存一条提取记录, 返回带 ID 的完整记录
    pub fn save(&self, new: NewExtraction) -> ExtractionEntry {
        self.save_at(new, Utc::now())
    }

    pub fn save_at(&self, new: NewExtraction, created_at: DateTime<Utc>) -> ExtractionEntry {
        let entry = ExtractionEntry {
            id: format!("EXT-{}", uuid::Uuid::new_v4().simple()),
            hotel_id: new.hotel_id,
            hotel_name: new.hotel_name,
            filename: new.filename,
            linen_count: new.data.linen_items.len(),
            uniform_count: new.data.uniform_items.len(),
            data: new.data,
            raw_text: new.raw_text,
            created_at,
        };
        self.entries.insert(entry.id.clone(), entry.clone());
        tracing::debug!("History saved: {} (hotel {})", entry.id, entry.hotel_id);
        entry
    }

    pub fn get(&self, id: &str) -> Option<ExtractionEntry> {
        self.entries.get(id).map(|e| e.value().clone())
    }

    /// 删除记录, 返回是否存在
    pub fn delete(&self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// 按条件查询, 创建时间倒序分页
    pub fn list(&self, query: &HistoryQuery) -> HistoryPage {
        let mut matched: Vec<ExtractionEntry> = self
            .entries
            .iter()
            .filter(|e| query.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();

        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let total = matched.len();
        let total_pages = total.div_ceil(limit);

        let history = matched
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        HistoryPage {
            history,
            total,
            page,
            total_pages,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
