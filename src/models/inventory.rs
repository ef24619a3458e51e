use serde::{Deserialize, Serialize};

/// 盘点单表头
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryHeader {
    pub company: String,
    pub sr_no: String,
    pub contractor_name: String,
    pub date: String,        // YYYY-MM-DD 或 OCR 原样日期串
    pub contact_no: String,
}

impl InventoryHeader {
    /// 空表头, 日期默认为给定日期
    pub fn with_date(date: impl Into<String>) -> Self {
        Self {
            company: String::new(),
            sr_no: String::new(),
            contractor_name: String::new(),
            date: date.into(),
            contact_no: String::new(),
        }
    }
}

/// 盘点明细行 (数量字段保持字符串, 不做数值校验)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub sr_no: u32,
    pub item: String,
    pub opening_balance: String,
    pub clean_received: String,
    pub total: String,
    pub soil_sent: String,
    pub closing_balance: String,
    pub remark: String,
}

impl LineItem {
    /// 按顺序把前五个数字串填入数量列, 缺失补 "0"
    pub fn from_columns(sr_no: u32, item: String, columns: &[&str]) -> Self {
        let col = |i: usize| columns.get(i).map(|s| s.to_string()).unwrap_or_else(|| "0".to_string());
        Self {
            sr_no,
            item,
            opening_balance: col(0),
            clean_received: col(1),
            total: col(2),
            soil_sent: col(3),
            closing_balance: col(4),
            remark: String::new(),
        }
    }
}

/// 解析结果: 表头 + 布草明细 + 制服明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub header: InventoryHeader,
    pub linen_items: Vec<LineItem>,
    pub uniform_items: Vec<LineItem>,
}

impl InventoryRecord {
    pub fn new(header: InventoryHeader) -> Self {
        Self {
            header,
            linen_items: Vec::new(),
            uniform_items: Vec::new(),
        }
    }

    pub fn item_count(&self) -> usize {
        self.linen_items.len() + self.uniform_items.len()
    }
}
