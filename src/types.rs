use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabled::Tabled;

/// One normalized daily row from a platform export.
///
/// Metrics are rounded to integers on entry; fractional cents or
/// impressions are not meaningful downstream. Rows that cannot produce a
/// valid record are dropped by the loader, never zero-filled.
#[derive(Debug, Clone)]
pub struct CanonicalRecord {
    pub date: NaiveDate,
    pub platform: String,
    pub campaign: String,
    pub cost: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub id: String,
}

/// The persisted report document, one per client.
///
/// `months` is a `BTreeMap` keyed by `YYYY-MM` so iteration is always in
/// ascending chronological order; the delta pass depends on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub client: ClientInfo,
    pub months: BTreeMap<String, MonthReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthReport {
    pub summary: MonthSummary,
    #[serde(rename = "previousMonthChange")]
    pub previous_month_change: ChangeBlock,
    pub platforms: BTreeMap<String, PlatformReport>,
    pub weeks: BTreeMap<String, WeekReport>,
}

/// Raw metric sums plus the ratios derived from them.
///
/// The ratios are always computed from the sums, never summed across
/// groups. `cpc` and `cpa` are truncated to whole yen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthSummary {
    pub cost: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub ctr: f64,
    pub cvr: f64,
    pub cpc: i64,
    pub cpa: i64,
}

/// Month-over-month percentage changes, one per summary metric.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeBlock {
    pub cost: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub ctr: f64,
    pub cvr: f64,
    pub cpc: f64,
    pub cpa: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformReport {
    pub cost: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub ctr: f64,
    pub cvr: f64,
    pub cpa: i64,
    #[serde(rename = "cpaChange")]
    pub cpa_change: f64,
    pub campaigns: Vec<CampaignReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReport {
    pub name: String,
    pub cost: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub cpa: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekReport {
    /// Textual range `"YYYY-MM-DD ~ YYYY-MM-DD"`, clamped to the month.
    pub dates: String,
    pub summary: WeekSummary,
    /// Daily totals in chronological order.
    pub daily: Vec<DayReport>,
    /// Per-platform breakdown; absent (not null) when the week carries no
    /// platform-attributable data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<BTreeMap<String, WeekPlatformSummary>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekSummary {
    pub cost: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub cpa: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekPlatformSummary {
    pub cost: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub ctr: f64,
    pub cvr: f64,
    pub cpa: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayReport {
    pub date: String,
    #[serde(rename = "dayOfWeek")]
    pub day_of_week: String,
    pub cost: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
}

/// Console preview row, one per month (values pre-formatted).
#[derive(Debug, Clone, Tabled)]
pub struct MonthPreviewRow {
    #[tabled(rename = "Month")]
    pub month: String,
    #[tabled(rename = "Cost")]
    pub cost: String,
    #[tabled(rename = "Impressions")]
    pub impressions: String,
    #[tabled(rename = "Clicks")]
    pub clicks: String,
    #[tabled(rename = "Conversions")]
    pub conversions: String,
    #[tabled(rename = "CTR%")]
    pub ctr: String,
    #[tabled(rename = "CVR%")]
    pub cvr: String,
    #[tabled(rename = "CPC")]
    pub cpc: String,
    #[tabled(rename = "CPA")]
    pub cpa: String,
}
