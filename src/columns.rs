// Per-platform column-name resolution.
//
// Every platform exports the same concepts under different header names
// (and different languages, and sometimes different names between console
// versions). Each canonical field carries an ordered candidate list per
// platform; the first candidate found anywhere in the header row wins.
use crate::error::{ReportError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Canonical metric fields every platform's columns are mapped onto.
pub const FIELD_DATE: &str = "date";
pub const FIELD_CAMPAIGN: &str = "campaign";
pub const FIELD_COST: &str = "cost";
pub const FIELD_IMPRESSIONS: &str = "impressions";
pub const FIELD_CLICKS: &str = "clicks";
pub const FIELD_CONVERSIONS: &str = "conversions";

/// Candidate header names per canonical field, for one platform.
pub type FieldCandidates = HashMap<String, Vec<String>>;

/// Per-platform column-map overrides, as read from a `--config` JSON file.
pub type ColumnOverrides = HashMap<String, FieldCandidates>;

fn candidates(pairs: &[(&str, &[&str])]) -> FieldCandidates {
    pairs
        .iter()
        .map(|(field, names)| {
            (
                field.to_string(),
                names.iter().map(|n| n.to_string()).collect(),
            )
        })
        .collect()
}

static BUILTIN_MAPS: Lazy<HashMap<String, FieldCandidates>> = Lazy::new(|| {
    let mut maps = HashMap::new();
    maps.insert(
        "google".to_string(),
        candidates(&[
            (FIELD_DATE, &["日", "Day", "Date", "日付"]),
            (FIELD_CAMPAIGN, &["キャンペーン", "Campaign", "Campaign name"]),
            (FIELD_COST, &["費用", "Cost", "費用（JPY）"]),
            (
                FIELD_IMPRESSIONS,
                &["表示回数", "Impr.", "Impressions", "インプレッション"],
            ),
            (FIELD_CLICKS, &["クリック数", "Clicks", "クリック"]),
            (
                FIELD_CONVERSIONS,
                &[
                    "コンバージョン",
                    "Conversions",
                    "Conv.",
                    "すべてのコンバージョン",
                ],
            ),
        ]),
    );
    maps.insert(
        "meta".to_string(),
        candidates(&[
            (FIELD_DATE, &["日", "Day", "Date", "日付", "Reporting starts"]),
            (
                FIELD_CAMPAIGN,
                &[
                    "広告セット名",
                    "キャンペーン名",
                    "Campaign name",
                    "Campaign Name",
                    "キャンペーン",
                ],
            ),
            (
                FIELD_COST,
                &[
                    "消化金額 (JPY)",
                    "消化金額",
                    "Amount spent",
                    "Amount Spent",
                    "費用",
                ],
            ),
            (FIELD_IMPRESSIONS, &["インプレッション", "Impressions", "リーチ"]),
            (
                FIELD_CLICKS,
                &[
                    "クリック(すべて)",
                    "クリック（すべて）",
                    "リンクのクリック",
                    "Link clicks",
                    "Clicks (all)",
                ],
            ),
            (
                FIELD_CONVERSIONS,
                &["結果", "Results", "コンバージョン", "Conversions"],
            ),
        ]),
    );
    maps.insert(
        "yahoo".to_string(),
        candidates(&[
            (FIELD_DATE, &["日", "Day", "Date", "日付"]),
            (FIELD_CAMPAIGN, &["キャンペーン名", "Campaign Name", "キャンペーン"]),
            (FIELD_COST, &["コスト（税込）", "Cost", "費用", "コスト"]),
            (
                FIELD_IMPRESSIONS,
                &["インプレッション数", "Impressions", "表示回数"],
            ),
            (FIELD_CLICKS, &["クリック数", "Clicks", "クリック"]),
            (
                FIELD_CONVERSIONS,
                &["コンバージョン数", "Conversions", "コンバージョン"],
            ),
        ]),
    );
    maps.insert(
        "line".to_string(),
        candidates(&[
            (FIELD_DATE, &["日付", "Date", "日"]),
            (FIELD_CAMPAIGN, &["キャンペーン名", "Campaign Name", "キャンペーン"]),
            (FIELD_COST, &["消化金額", "Cost", "費用"]),
            (FIELD_IMPRESSIONS, &["インプレッション", "Impressions", "imp"]),
            (FIELD_CLICKS, &["クリック数", "Clicks", "クリック"]),
            (FIELD_CONVERSIONS, &["コンバージョン", "Conversions", "CV"]),
        ]),
    );
    maps
});

/// Header indices resolved for one file.
///
/// `date` and `cost` are mandatory; the rest degrade to defaults when the
/// platform export simply does not carry the column.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedColumns {
    pub date: usize,
    pub campaign: Option<usize>,
    pub cost: usize,
    pub impressions: Option<usize>,
    pub clicks: Option<usize>,
    pub conversions: Option<usize>,
}

/// Immutable column-map configuration, built once at startup.
///
/// Overrides from a config file are merged over the built-in tables here,
/// during construction; resolution never consults global state.
#[derive(Debug, Clone)]
pub struct ColumnMaps {
    maps: HashMap<String, FieldCandidates>,
}

impl ColumnMaps {
    /// The built-in per-platform candidate tables.
    pub fn builtin() -> Self {
        Self {
            maps: BUILTIN_MAPS.clone(),
        }
    }

    /// Merge user-supplied overrides over the built-ins.
    ///
    /// An override replaces the candidate list per field; fields it does not
    /// mention keep their built-in candidates. Unknown platforms are added
    /// wholesale.
    pub fn with_overrides(mut self, overrides: ColumnOverrides) -> Self {
        for (platform, fields) in overrides {
            let entry = self.maps.entry(platform).or_default();
            for (field, names) in fields {
                entry.insert(field, names);
            }
        }
        self
    }

    /// Resolve the canonical fields against an actual header row.
    ///
    /// Candidate order is decisive: the first candidate that matches any
    /// header (after trimming the header) wins, regardless of where that
    /// header sits in the row.
    pub fn resolve(&self, platform: &str, headers: &[String]) -> Result<ResolvedColumns> {
        static EMPTY: Lazy<FieldCandidates> = Lazy::new(HashMap::new);
        let fields = self.maps.get(platform).unwrap_or(&EMPTY);

        let find = |field: &str| -> Option<usize> {
            let names = fields.get(field)?;
            for candidate in names {
                if let Some(idx) = headers.iter().position(|h| h.trim() == candidate.as_str()) {
                    return Some(idx);
                }
            }
            None
        };
        let require = |field: &'static str| -> Result<usize> {
            find(field).ok_or_else(|| ReportError::MissingColumn {
                field,
                candidates: fields.get(field).cloned().unwrap_or_default(),
                headers: headers.to_vec(),
            })
        };

        Ok(ResolvedColumns {
            date: require(FIELD_DATE)?,
            campaign: find(FIELD_CAMPAIGN),
            cost: require(FIELD_COST)?,
            impressions: find(FIELD_IMPRESSIONS),
            clicks: find(FIELD_CLICKS),
            conversions: find(FIELD_CONVERSIONS),
        })
    }
}
