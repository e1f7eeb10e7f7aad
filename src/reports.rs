// Rollup construction: month → {summary, platforms → campaigns, weeks →
// days}, month-over-month deltas, and incremental merge into a previously
// persisted document.
use crate::types::{
    CampaignReport, CanonicalRecord, ChangeBlock, ClientInfo, DayReport, MonthReport,
    MonthSummary, PlatformReport, ReportDocument, WeekPlatformSummary, WeekReport, WeekSummary,
};
use crate::util::{calc_change, month_end, month_start, round2, safe_div, weekday_label};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Placeholder client used when no name was ever supplied.
pub const DEFAULT_CLIENT_NAME: &str = "クライアント名";
pub const DEFAULT_CLIENT_ID: &str = "client";

/// Running totals of the four raw metrics.
///
/// Ratios are derived from these at the end of each grouping, never summed
/// across groups.
#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    cost: i64,
    impressions: i64,
    clicks: i64,
    conversions: i64,
}

impl Sums {
    fn add(&mut self, r: &CanonicalRecord) {
        self.cost += r.cost;
        self.impressions += r.impressions;
        self.clicks += r.clicks;
        self.conversions += r.conversions;
    }

    fn ctr(&self) -> f64 {
        round2(safe_div(self.clicks as f64, self.impressions as f64) * 100.0)
    }

    fn cvr(&self) -> f64 {
        round2(safe_div(self.conversions as f64, self.clicks as f64) * 100.0)
    }

    fn cpc(&self) -> i64 {
        safe_div(self.cost as f64, self.clicks as f64) as i64
    }

    fn cpa(&self) -> i64 {
        safe_div(self.cost as f64, self.conversions as f64) as i64
    }
}

/// Build the final document.
///
/// Starts from `prior` when supplied (merge mode): newly built months
/// overwrite same-keyed entries wholesale and untouched months carry
/// through. The client block is only replaced when a client was explicitly
/// given. All deltas are recomputed over the merged timeline at the end, so
/// inserting a month earlier than previously-known data stays consistent.
pub fn build_document(
    records: &[CanonicalRecord],
    client: Option<ClientInfo>,
    prior: Option<ReportDocument>,
) -> ReportDocument {
    let mut doc = prior.unwrap_or_else(|| ReportDocument {
        client: ClientInfo {
            name: DEFAULT_CLIENT_NAME.to_string(),
            id: DEFAULT_CLIENT_ID.to_string(),
        },
        months: BTreeMap::new(),
    });
    if let Some(client) = client {
        doc.client = client;
    }

    for (key, month) in build_months(records) {
        doc.months.insert(key, month);
    }
    recompute_changes(&mut doc);
    doc
}

/// Group records by `YYYY-MM` and build one report per month.
pub fn build_months(records: &[CanonicalRecord]) -> BTreeMap<String, MonthReport> {
    let mut by_month: BTreeMap<String, Vec<&CanonicalRecord>> = BTreeMap::new();
    for r in records {
        by_month
            .entry(r.date.format("%Y-%m").to_string())
            .or_default()
            .push(r);
    }
    by_month
        .into_iter()
        .map(|(key, month_records)| (key, build_month(&month_records)))
        .collect()
}

fn month_summary(sums: Sums) -> MonthSummary {
    MonthSummary {
        cost: sums.cost,
        impressions: sums.impressions,
        clicks: sums.clicks,
        conversions: sums.conversions,
        ctr: sums.ctr(),
        cvr: sums.cvr(),
        cpc: sums.cpc(),
        cpa: sums.cpa(),
    }
}

fn build_month(records: &[&CanonicalRecord]) -> MonthReport {
    let mut total = Sums::default();
    for r in records {
        total.add(r);
    }

    MonthReport {
        summary: month_summary(total),
        // Filled in by recompute_changes once the full timeline is known.
        previous_month_change: ChangeBlock::default(),
        platforms: build_platforms(records),
        weeks: build_weeks(records),
    }
}

fn build_platforms(records: &[&CanonicalRecord]) -> BTreeMap<String, PlatformReport> {
    let mut by_platform: BTreeMap<String, Vec<&CanonicalRecord>> = BTreeMap::new();
    for r in records {
        by_platform.entry(r.platform.clone()).or_default().push(r);
    }

    by_platform
        .into_iter()
        .map(|(platform, platform_records)| {
            let mut sums = Sums::default();
            // BTreeMap keys give the name-sorted campaign order.
            let mut by_campaign: BTreeMap<String, Sums> = BTreeMap::new();
            for r in &platform_records {
                sums.add(r);
                by_campaign.entry(r.campaign.clone()).or_default().add(r);
            }

            let campaigns = by_campaign
                .into_iter()
                .map(|(name, c)| CampaignReport {
                    name,
                    cost: c.cost,
                    impressions: c.impressions,
                    clicks: c.clicks,
                    conversions: c.conversions,
                    cpa: c.cpa(),
                })
                .collect();

            let report = PlatformReport {
                cost: sums.cost,
                impressions: sums.impressions,
                clicks: sums.clicks,
                conversions: sums.conversions,
                ctr: sums.ctr(),
                cvr: sums.cvr(),
                cpa: sums.cpa(),
                cpa_change: 0.0,
                campaigns,
            };
            (platform, report)
        })
        .collect()
}

fn build_weeks(records: &[&CanonicalRecord]) -> BTreeMap<String, WeekReport> {
    let Some(first) = records.first() else {
        return BTreeMap::new();
    };
    let start = month_start(first.date);
    let end = month_end(first.date);

    // Week number anchored to the first of the month, not to weekday
    // boundaries; the final week of a month may be shorter than 7 days.
    let mut by_week: BTreeMap<i64, Vec<&CanonicalRecord>> = BTreeMap::new();
    for r in records {
        let week_number = (r.date - start).num_days() / 7 + 1;
        by_week.entry(week_number).or_default().push(r);
    }

    by_week
        .into_iter()
        .map(|(week_number, week_records)| {
            let week_start = start + Duration::days((week_number - 1) * 7);
            let week_end = (week_start + Duration::days(6)).min(end);

            let mut sums = Sums::default();
            let mut by_day: BTreeMap<NaiveDate, Sums> = BTreeMap::new();
            let mut by_platform: BTreeMap<String, Sums> = BTreeMap::new();
            for r in &week_records {
                sums.add(r);
                by_day.entry(r.date).or_default().add(r);
                by_platform.entry(r.platform.clone()).or_default().add(r);
            }

            let daily = by_day
                .into_iter()
                .map(|(date, d)| DayReport {
                    date: date.format("%Y-%m-%d").to_string(),
                    day_of_week: weekday_label(date).to_string(),
                    cost: d.cost,
                    impressions: d.impressions,
                    clicks: d.clicks,
                    conversions: d.conversions,
                })
                .collect();

            let platforms: BTreeMap<String, WeekPlatformSummary> = by_platform
                .into_iter()
                .map(|(platform, p)| {
                    (
                        platform,
                        WeekPlatformSummary {
                            cost: p.cost,
                            impressions: p.impressions,
                            clicks: p.clicks,
                            conversions: p.conversions,
                            ctr: p.ctr(),
                            cvr: p.cvr(),
                            cpa: p.cpa(),
                        },
                    )
                })
                .collect();

            let report = WeekReport {
                dates: format!(
                    "{} ~ {}",
                    week_start.format("%Y-%m-%d"),
                    week_end.format("%Y-%m-%d")
                ),
                summary: WeekSummary {
                    cost: sums.cost,
                    impressions: sums.impressions,
                    clicks: sums.clicks,
                    conversions: sums.conversions,
                    cpa: sums.cpa(),
                },
                daily,
                platforms: if platforms.is_empty() {
                    None
                } else {
                    Some(platforms)
                },
            };
            (format!("week{week_number}"), report)
        })
        .collect()
}

/// Recompute every month's `previousMonthChange` and every platform's
/// `cpaChange` across the complete chronological month sequence.
pub fn recompute_changes(doc: &mut ReportDocument) {
    let mut prev: Option<(MonthSummary, HashMap<String, i64>)> = None;

    for month in doc.months.values_mut() {
        match &prev {
            None => {
                // The earliest month has no baseline.
                month.previous_month_change = ChangeBlock::default();
            }
            Some((prev_summary, prev_cpas)) => {
                let curr = &month.summary;
                month.previous_month_change = ChangeBlock {
                    cost: calc_change(curr.cost as f64, prev_summary.cost as f64),
                    impressions: calc_change(
                        curr.impressions as f64,
                        prev_summary.impressions as f64,
                    ),
                    clicks: calc_change(curr.clicks as f64, prev_summary.clicks as f64),
                    conversions: calc_change(
                        curr.conversions as f64,
                        prev_summary.conversions as f64,
                    ),
                    ctr: calc_change(curr.ctr, prev_summary.ctr),
                    cvr: calc_change(curr.cvr, prev_summary.cvr),
                    cpc: calc_change(curr.cpc as f64, prev_summary.cpc as f64),
                    cpa: calc_change(curr.cpa as f64, prev_summary.cpa as f64),
                };
                for (platform, report) in month.platforms.iter_mut() {
                    // A platform absent from the previous month keeps its
                    // current cpaChange (0 for freshly built months).
                    if let Some(prev_cpa) = prev_cpas.get(platform) {
                        report.cpa_change = calc_change(report.cpa as f64, *prev_cpa as f64);
                    }
                }
            }
        }

        let platform_cpas = month
            .platforms
            .iter()
            .map(|(platform, report)| (platform.clone(), report.cpa))
            .collect();
        prev = Some((month.summary.clone(), platform_cpas));
    }
}
