// Per-file loading: decode, find the real header row, resolve columns and
// normalize data rows into canonical records.
use crate::columns::ColumnMaps;
use crate::decode::decode_text;
use crate::error::{ReportError, Result};
use crate::types::CanonicalRecord;
use crate::util::{parse_date, parse_number};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;

/// Labels of platform-emitted grand-total lines, not daily data.
const TOTAL_SENTINELS: [&str; 2] = ["合計", "Total"];

/// Campaign name used when the export carries no campaign column.
pub const CAMPAIGN_OVERALL: &str = "全体";

/// Strategy for finding the real header row inside a file that may carry
/// leading title/date-range/blank lines.
pub trait HeaderLocate {
    /// Index of the header line, or `None` when no line qualifies.
    fn locate(&self, lines: &[&str]) -> Option<usize>;
}

/// Default heuristic: the header is the first line that is non-empty, not
/// comment-prefixed, and has enough comma-separated fields.
///
/// Google Ads exports in particular prepend a title line and a date-range
/// line; neither contains enough commas to pass the threshold. A metadata
/// line that happens to contain that many commas is misidentified as the
/// header; there is deliberately no guard for that here.
#[derive(Debug, Clone)]
pub struct DelimiterThreshold {
    pub min_fields: usize,
}

impl Default for DelimiterThreshold {
    fn default() -> Self {
        Self { min_fields: 4 }
    }
}

impl HeaderLocate for DelimiterThreshold {
    fn locate(&self, lines: &[&str]) -> Option<usize> {
        for (idx, line) in lines.iter().enumerate() {
            let stripped = line.trim();
            if stripped.is_empty() || stripped.starts_with('#') {
                continue;
            }
            if stripped.matches(',').count() < self.min_fields - 1 {
                continue;
            }
            return Some(idx);
        }
        None
    }
}

/// What happened while loading one file.
///
/// `dropped_rows` is the observable data-loss count: rows whose date failed
/// to parse (or that the CSV reader rejected outright). `skipped_totals`
/// counts blank-date and grand-total lines, which are expected noise.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub records: usize,
    pub skipped_totals: usize,
    pub dropped_rows: usize,
}

/// Loader for platform CSV exports.
///
/// Holds the column-map configuration and the header-location strategy;
/// both are fixed at construction so every file is handled the same way.
pub struct CsvLoader {
    maps: ColumnMaps,
    locator: Box<dyn HeaderLocate>,
}

impl CsvLoader {
    pub fn new(maps: ColumnMaps) -> Self {
        Self {
            maps,
            locator: Box::new(DelimiterThreshold::default()),
        }
    }

    /// Swap in a different header-location strategy.
    pub fn with_locator(mut self, locator: Box<dyn HeaderLocate>) -> Self {
        self.locator = locator;
        self
    }

    /// Read and normalize one platform export from disk.
    pub fn load_file(
        &self,
        path: &Path,
        platform: &str,
    ) -> Result<(Vec<CanonicalRecord>, LoadReport)> {
        let bytes = fs::read(path)?;
        self.parse_bytes(&bytes, platform, path)
    }

    /// Normalize one platform export from raw bytes.
    ///
    /// A file that yields zero records is not an error here; the caller
    /// decides whether "no records across all files" is fatal.
    pub fn parse_bytes(
        &self,
        bytes: &[u8],
        platform: &str,
        path: &Path,
    ) -> Result<(Vec<CanonicalRecord>, LoadReport)> {
        let content = decode_text(bytes, path)?;
        let lines: Vec<&str> = content.lines().collect();

        let header_idx = self
            .locator
            .locate(&lines)
            .ok_or_else(|| ReportError::HeaderNotFound {
                path: path.to_path_buf(),
            })?;
        let body = lines[header_idx..].join("\n");

        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .from_reader(body.as_bytes());
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|_| ReportError::HeaderNotFound {
                path: path.to_path_buf(),
            })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let cols = self.maps.resolve(platform, &headers)?;

        let mut records = Vec::new();
        let mut report = LoadReport::default();

        for row in rdr.records() {
            report.total_rows += 1;
            let row = match row {
                Ok(r) => r,
                Err(_) => {
                    report.dropped_rows += 1;
                    continue;
                }
            };

            let date_cell = row.get(cols.date).map(str::trim).unwrap_or("");
            if date_cell.is_empty() || TOTAL_SENTINELS.contains(&date_cell) {
                report.skipped_totals += 1;
                continue;
            }
            let date = match parse_date(date_cell) {
                Ok(d) => d,
                Err(_) => {
                    report.dropped_rows += 1;
                    continue;
                }
            };

            let campaign = match cols.campaign {
                Some(idx) => row.get(idx).unwrap_or("").trim().to_string(),
                None => CAMPAIGN_OVERALL.to_string(),
            };

            let metric = |idx: Option<usize>| -> i64 {
                let cell = idx.and_then(|i| row.get(i));
                parse_number(cell).round().max(0.0) as i64
            };

            records.push(CanonicalRecord {
                date,
                platform: platform.to_string(),
                campaign,
                cost: metric(Some(cols.cost)),
                impressions: metric(cols.impressions),
                clicks: metric(cols.clicks),
                conversions: metric(cols.conversions),
            });
            report.records += 1;
        }

        Ok((records, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use std::path::PathBuf;

    fn loader() -> CsvLoader {
        CsvLoader::new(ColumnMaps::builtin())
    }

    fn path() -> PathBuf {
        PathBuf::from("test.csv")
    }

    #[test]
    fn test_locate_skips_noisy_preamble() {
        let strategy = DelimiterThreshold::default();
        let lines = vec![
            "キャンペーン レポート",
            "",
            "# 2024/03/01 - 2024/03/31",
            "日,キャンペーン,費用,表示回数,クリック数",
            "2024/03/01,Brand,100,1000,50",
        ];
        assert_eq!(strategy.locate(&lines), Some(3));
    }

    #[test]
    fn test_locate_none_when_no_line_qualifies() {
        let strategy = DelimiterThreshold::default();
        assert_eq!(strategy.locate(&["title", "a,b", ""]), None);
    }

    #[test]
    fn test_parse_google_export_with_preamble() {
        let csv = "\
キャンペーン レポート
2024年3月1日～2024年3月31日

日,キャンペーン,費用,表示回数,クリック数,コンバージョン
2024/03/01,ブランド,\"1,000\",5000,120,3
2024/03/02,ブランド,¥800,4000,90,2
合計,,1800,9000,210,5
";
        let (records, report) = loader()
            .parse_bytes(csv.as_bytes(), "google", &path())
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.records, 2);
        assert_eq!(report.skipped_totals, 1);
        assert_eq!(report.dropped_rows, 0);

        let first = &records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(first.platform, "google");
        assert_eq!(first.campaign, "ブランド");
        assert_eq!(first.cost, 1000);
        assert_eq!(first.impressions, 5000);
        assert_eq!(first.clicks, 120);
        assert_eq!(first.conversions, 3);
        assert_eq!(records[1].cost, 800);
    }

    #[test]
    fn test_parse_counts_dropped_dates() {
        let csv = "\
日,キャンペーン,費用,表示回数,クリック数
2024/03/01,A,100,1000,50
not-a-date,A,100,1000,50
2024/03/03,A,200,2000,60
";
        let (records, report) = loader()
            .parse_bytes(csv.as_bytes(), "google", &path())
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.dropped_rows, 1);
    }

    #[test]
    fn test_parse_missing_campaign_column_defaults_to_overall() {
        let csv = "\
日,費用,表示回数,クリック数,コンバージョン
2024/03/01,100,1000,50,5
";
        let (records, _) = loader()
            .parse_bytes(csv.as_bytes(), "google", &path())
            .unwrap();
        assert_eq!(records[0].campaign, CAMPAIGN_OVERALL);
    }

    #[test]
    fn test_parse_blank_metrics_degrade_to_zero() {
        let csv = "\
日,キャンペーン名,コスト（税込）,インプレッション数,クリック数,コンバージョン数
2024/03/01,A,500,--,N/A,
";
        let (records, _) = loader()
            .parse_bytes(csv.as_bytes(), "yahoo", &path())
            .unwrap();
        assert_eq!(records[0].cost, 500);
        assert_eq!(records[0].impressions, 0);
        assert_eq!(records[0].clicks, 0);
        assert_eq!(records[0].conversions, 0);
    }

    #[test]
    fn test_parse_missing_cost_column_is_fatal() {
        let csv = "\
日,キャンペーン,表示回数,クリック数,コンバージョン
2024/03/01,A,1000,50,5
";
        let err = loader()
            .parse_bytes(csv.as_bytes(), "google", &path())
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingColumn { field: "cost", .. }
        ));
    }

    #[test]
    fn test_parse_no_header_row() {
        let err = loader()
            .parse_bytes(b"just a title\nshort,line\n", "google", &path())
            .unwrap_err();
        assert!(matches!(err, ReportError::HeaderNotFound { .. }));
    }

    #[test]
    fn test_custom_locator_is_used() {
        struct FirstLine;
        impl HeaderLocate for FirstLine {
            fn locate(&self, _lines: &[&str]) -> Option<usize> {
                Some(0)
            }
        }
        // Too few commas for the default strategy, accepted by FirstLine.
        let csv = "日,費用\n2024/03/01,100\n";
        let (records, _) = CsvLoader::new(ColumnMaps::builtin())
            .with_locator(Box::new(FirstLine))
            .parse_bytes(csv.as_bytes(), "google", &path())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cost, 100);
    }

    #[test]
    fn test_load_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "日付,キャンペーン名,消化金額,インプレッション,クリック数,コンバージョン\n\
             2024/03/05,Spring,300,1500,40,2\n"
        )
        .unwrap();
        let (records, report) = loader().load_file(file.path(), "line").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.records, 1);
        assert_eq!(records[0].platform, "line");
        assert_eq!(records[0].cost, 300);
    }

    #[test]
    fn test_load_file_shift_jis_bytes() {
        // Header "日,キャンペーン,費用,表示回数,クリック数" plus one data
        // row, encoded as Shift_JIS.
        let header = "日,キャンペーン,費用,表示回数,クリック数\n2024/03/01,テスト,100,1000,50\n";
        let (encoded, _, had_errors) = encoding_rs::SHIFT_JIS.encode(header);
        assert!(!had_errors);
        let (records, _) = loader()
            .parse_bytes(&encoded, "google", &path())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].campaign, "テスト");
    }
}
