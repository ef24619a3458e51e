use crate::models::{InventoryHeader, InventoryRecord, LineItem};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{1,2}[-/][0-9]{1,2}[-/][0-9]{2,4}").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{10,}").unwrap());
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]{3,}").unwrap());

/// 布草/制服关键词 (顺序影响品名截取, 以最后命中的为准)
pub const ITEM_KEYWORDS: &[&str] = &[
    "bed sheet", "bedsheet", "pillow", "towel", "bath towel", "hand towel",
    "face towel", "blanket", "duvet", "mattress", "curtain", "napkin",
    "table cloth", "bath mat", "bed cover", "quilt", "comforter",
    "pillow cover", "cushion", "runner", "apron", "chef coat", "uniform",
];

/// 归入制服明细的关键词
const UNIFORM_MARKERS: &[&str] = &["uniform", "chef", "apron"];

/// 品名截取窗口: 关键词之后再取 20 个字符
const NAME_WINDOW: usize = 20;

/// 解析 OCR 文本为盘点记录, 表头日期默认当天 (UTC)
pub fn parse_inventory(raw_text: &str) -> InventoryRecord {
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    parse_inventory_with_date(raw_text, &today)
}

/// 同 [`parse_inventory`], 由调用方指定默认日期
pub fn parse_inventory_with_date(raw_text: &str, default_date: &str) -> InventoryRecord {
    let lines: Vec<&str> = raw_text.split('\n').filter(|l| !l.trim().is_empty()).collect();

    let mut record = InventoryRecord::new(InventoryHeader::with_date(default_date));

    for line in &lines {
        apply_header_line(&mut record.header, line);
    }

    // 1. 关键词匹配: 布草与制服共用同一序号
    let mut sr_no = 1u32;
    for line in &lines {
        let lower = line.to_ascii_lowercase();
        if !ITEM_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }

        let numbers = digit_runs(line);
        let name = item_name(line, &lower);
        let item = LineItem::from_columns(sr_no, name, &numbers);

        if UNIFORM_MARKERS.iter().any(|m| lower.contains(m)) {
            record.uniform_items.push(item);
        } else {
            record.linen_items.push(item);
        }
        sr_no += 1;
    }

    // 2. 兜底: 没有任何关键词命中时, 把 "含数字 + 含单词" 的行都当作布草
    if record.item_count() == 0 {
        let candidates = lines.iter().filter(|line| {
            line.bytes().any(|b| b.is_ascii_digit())
                && WORD_RE.is_match(line)
                && line.trim().chars().count() > 5
        });

        for (idx, line) in candidates.enumerate() {
            let text = strip_digits(line);
            if text.chars().count() > 2 {
                let numbers = digit_runs(line);
                record
                    .linen_items
                    .push(LineItem::from_columns(idx as u32 + 1, text, &numbers));
            }
        }

        if !record.linen_items.is_empty() {
            tracing::debug!(
                "No keyword matched, fallback produced {} linen rows",
                record.linen_items.len()
            );
        }
    }

    tracing::debug!(
        "Parsed {} lines: {} linen, {} uniform",
        lines.len(),
        record.linen_items.len(),
        record.uniform_items.len()
    );

    record
}

/// 表头字段提取, 后出现的行覆盖先出现的
fn apply_header_line(header: &mut InventoryHeader, line: &str) {
    let lower = line.to_ascii_lowercase();

    if lower.contains("date") || lower.contains("dt") {
        if let Some(m) = DATE_RE.find(line) {
            header.date = m.as_str().to_string();
        }
    }

    if lower.contains("company") || lower.contains("hotel") {
        header.company = after_last_colon(line)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| line.trim())
            .to_string();
    }

    // 没有冒号时置空 (与 company 规则不同)
    if lower.contains("contractor") || lower.contains("vendor") {
        header.contractor_name = after_last_colon(line).unwrap_or_default().to_string();
    }

    if lower.contains("contact") || lower.contains("phone") || lower.contains("mobile") {
        if let Some(m) = PHONE_RE.find(line) {
            header.contact_no = m.as_str().to_string();
        }
    }
}

/// 最后一个冒号之后的内容 (已 trim), 无冒号返回 None
fn after_last_colon(line: &str) -> Option<&str> {
    line.rfind(':').map(|idx| line[idx + 1..].trim())
}

fn digit_runs(line: &str) -> Vec<&str> {
    DIGITS_RE.find_iter(line).map(|m| m.as_str()).collect()
}

fn strip_digits(line: &str) -> String {
    DIGITS_RE.replace_all(line, "").trim().to_string()
}

/// 品名: 从最后命中的关键词位置起取一段, 遇数字截断
fn item_name(line: &str, lower: &str) -> String {
    // lower 为 ASCII 小写, 字节偏移与原行一致
    let hit = ITEM_KEYWORDS
        .iter()
        .filter_map(|k| lower.find(k).map(|idx| (idx, k.len())))
        .last();

    let name = hit
        .map(|(idx, len)| {
            let window: String = line[idx..].chars().take(len + NAME_WINDOW).collect();
            let cut = window.find(|c: char| c.is_ascii_digit()).unwrap_or(window.len());
            window[..cut].trim().to_string()
        })
        .unwrap_or_default();

    if name.is_empty() {
        strip_digits(line)
    } else {
        name
    }
}
