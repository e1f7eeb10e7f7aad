// Utility helpers for field parsing and report arithmetic.
//
// This module centralizes all the "dirty" CSV number/date handling so the
// rest of the code can assume clean, typed values.
use crate::error::ReportError;
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Date formats accepted across platform exports, tried in order.
const DATE_FORMATS: [&str; 6] = [
    "%Y/%m/%d",
    "%Y-%m-%d",
    "%Y年%m月%d日",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y.%m.%d",
];

/// Cell values that mean "no data" rather than a malformed number.
const BLANK_SENTINELS: [&str; 5] = ["", "--", "-", "N/A", "nan"];

/// Single-character weekday labels, Monday first.
const WEEKDAY_LABELS: [&str; 7] = ["月", "火", "水", "木", "金", "土", "日"];

/// Parse a metric cell into `f64` while being forgiving about the
/// formatting found in ad-platform exports.
///
/// - Accepts `Option<&str>` so callers can pass through optional columns.
/// - Strips thousands separators, currency symbols and `%`.
/// - Treats the usual blank sentinels (`--`, `N/A`, ...) as zero.
/// - Returns 0 for anything that still fails to parse; a malformed number
///   never aborts a row.
pub fn parse_number(s: Option<&str>) -> f64 {
    let Some(s) = s else {
        return 0.0;
    };
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | '¥' | '￥' | '$' | '%'))
        .collect();
    let cleaned = cleaned.trim();
    if BLANK_SENTINELS.contains(&cleaned) {
        return 0.0;
    }
    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Parse a date cell, trying each supported format in order.
///
/// The caller treats a failure as "drop this row", not "abort the file".
pub fn parse_date(s: &str) -> Result<NaiveDate, ReportError> {
    let cleaned = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(cleaned, fmt) {
            return Ok(d);
        }
    }
    Err(ReportError::DateFormat(cleaned.to_string()))
}

/// Division that yields 0 instead of dividing by zero.
pub fn safe_div(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return 0.0;
    }
    a / b
}

/// Period-over-period change in percent, rounded to 1 decimal.
///
/// A zero baseline cannot produce a true percentage: the convention is 0
/// when nothing changed and a capped 100.0 otherwise.
pub fn calc_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current == 0.0 { 0.0 } else { 100.0 };
    }
    ((current - previous) / previous * 1000.0).round() / 10.0
}

/// Round to 2 decimals, used for the derived CTR/CVR percentages.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Japanese single-character day-of-week label for a date.
pub fn weekday_label(date: NaiveDate) -> &'static str {
    WEEKDAY_LABELS[date.weekday().num_days_from_monday() as usize]
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("day 1 is always valid")
}

/// Last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = (date.year(), date.month());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.expect("first of month is always valid")
        .pred_opt()
        .expect("predecessor of a first-of-month always exists")
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values. This is used
    // for counts in console messages (e.g., `1,234 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
