use crate::error::Result;
use crate::types::ReportDocument;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Serialize the document and write it in one shot.
///
/// The document is fully constructed in memory before this point, so a
/// failed run never leaves a partial file behind. `to_string_pretty` gives
/// 2-space indentation and keeps non-ASCII characters literal.
pub fn write_document(path: &Path, doc: &ReportDocument) -> Result<()> {
    let s = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Read a previously persisted document for merge mode.
///
/// A missing, unreadable or malformed file yields `None`; the caller warns
/// and falls back to a fresh build.
pub fn read_document(path: &Path) -> Option<ReportDocument> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::build_document;
    use crate::types::{CanonicalRecord, ClientInfo};
    use chrono::NaiveDate;

    fn sample_document() -> ReportDocument {
        let records = vec![CanonicalRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            platform: "google".to_string(),
            campaign: "全体".to_string(),
            cost: 100,
            impressions: 1000,
            clicks: 50,
            conversions: 5,
        }];
        build_document(
            &records,
            Some(ClientInfo {
                name: "株式会社ABC".to_string(),
                id: "abc".to_string(),
            }),
            None,
        )
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let doc = sample_document();
        write_document(&path, &doc).unwrap();
        let read = read_document(&path).unwrap();

        assert_eq!(read.client.name, "株式会社ABC");
        assert_eq!(read.months["2024-03"].summary.cost, 100);
        assert_eq!(
            serde_json::to_string(&read).unwrap(),
            serde_json::to_string(&doc).unwrap()
        );
    }

    #[test]
    fn test_written_json_keeps_non_ascii_and_indentation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        write_document(&path, &sample_document()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        // Non-ASCII stays literal, no \uXXXX escaping.
        assert!(raw.contains("株式会社ABC"));
        assert!(raw.contains("全体"));
        assert!(!raw.contains("\\u"));
        assert!(raw.contains("  \"client\""));
        // The camelCase keys of the original document shape.
        assert!(raw.contains("\"previousMonthChange\""));
        assert!(raw.contains("\"dayOfWeek\""));
        assert!(raw.contains("\"cpaChange\""));
    }

    #[test]
    fn test_read_document_missing_file() {
        assert!(read_document(Path::new("/nonexistent/data.json")).is_none());
    }

    #[test]
    fn test_read_document_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(read_document(&path).is_none());
    }
}
