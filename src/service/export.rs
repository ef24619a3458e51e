use crate::models::{InventoryRecord, LineItem};
use std::string::FromUtf8Error;
use thiserror::Error;

const ITEM_COLUMNS: [&str; 8] = [
    "Sr No",
    "Item",
    "Opening Balance",
    "Clean Received",
    "Total",
    "Soil Sent",
    "Closing Balance",
    "Remark",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv flush failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv output is not utf-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("json encode failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// 导出盘点记录为 CSV 报表
///
/// 依次输出标题、表头信息、布草明细、制服明细, 各段之间空一行;
/// 明细为空的段落省略。
pub fn export_csv(record: &InventoryRecord) -> Result<String, ExportError> {
    let mut out = String::new();

    out.push_str(&write_section(&[vec!["Linen Inventory Report".to_string()]])?);
    out.push('\n');

    let header = &record.header;
    out.push_str(&write_section(&[
        vec!["Company".to_string(), header.company.clone()],
        vec!["Date".to_string(), header.date.clone()],
        vec!["Contractor".to_string(), header.contractor_name.clone()],
    ])?);
    out.push('\n');

    if !record.linen_items.is_empty() {
        out.push_str(&items_section("Linen Items", &record.linen_items)?);
        out.push('\n');
    }

    if !record.uniform_items.is_empty() {
        out.push_str(&items_section("Uniform Items", &record.uniform_items)?);
    }

    Ok(out)
}

/// 导出为格式化 JSON
pub fn export_json(record: &InventoryRecord) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(record)?)
}

fn items_section(title: &str, items: &[LineItem]) -> Result<String, ExportError> {
    let mut rows = Vec::with_capacity(items.len() + 2);
    rows.push(vec![title.to_string()]);
    rows.push(ITEM_COLUMNS.iter().map(|c| c.to_string()).collect());
    for item in items {
        rows.push(vec![
            item.sr_no.to_string(),
            item.item.clone(),
            item.opening_balance.clone(),
            item.clean_received.clone(),
            item.total.clone(),
            item.soil_sent.clone(),
            item.closing_balance.clone(),
            item.remark.clone(),
        ]);
    }
    write_section(&rows)
}

fn write_section(rows: &[Vec<String>]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::parser::parse_inventory_with_date;

    #[test]
    fn report_layout_matches_sections() {
        let mut record = parse_inventory_with_date(
            "Hotel: Grand\nVendor: Clean Co\nTowel 10 5 12 2 13\nChef Coat 3 1 4 0 4",
            "2024-06-01",
        );
        record.linen_items[0].remark = "torn".to_string();

        let csv = export_csv(&record).unwrap();
        let expected = "\
Linen Inventory Report

Company,Grand
Date,2024-06-01
Contractor,Clean Co

Linen Items
Sr No,Item,Opening Balance,Clean Received,Total,Soil Sent,Closing Balance,Remark
1,Towel,10,5,12,2,13,torn

Uniform Items
Sr No,Item,Opening Balance,Clean Received,Total,Soil Sent,Closing Balance,Remark
2,Chef Coat,3,1,4,0,4,
";
        assert_eq!(csv, expected);
    }

    #[test]
    fn empty_sections_are_omitted_and_commas_quoted() {
        let mut record = parse_inventory_with_date("", "2024-06-01");
        record.header.company = "Sea View, Goa".to_string();

        let csv = export_csv(&record).unwrap();
        assert!(csv.contains("Company,\"Sea View, Goa\"\n"));
        assert!(!csv.contains("Linen Items"));
        assert!(!csv.contains("Uniform Items"));
    }

    #[test]
    fn json_export_keeps_field_names() {
        let record = parse_inventory_with_date("Duvet 9", "2024-06-01");
        let json: serde_json::Value = serde_json::from_str(&export_json(&record).unwrap()).unwrap();
        assert_eq!(json["linen_items"][0]["item"], "Duvet");
        assert_eq!(json["linen_items"][0]["closing_balance"], "0");
        assert_eq!(json["header"]["date"], "2024-06-01");
    }
}
