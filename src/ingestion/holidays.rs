//! Holiday flow: a single date-range API call across the configured
//! years, falling back to one call per calendar year when the
//! range call fails, grouped into monthly HolidayStat rows.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::calendar::is_long_weekend;
use crate::clients::HolidayApiClient;
use crate::model::{HolidayEntry, HolidayStat};
use crate::repos::HolidayRepository;
use crate::scoring::functions::holiday_score;

#[derive(Debug, Default)]
pub struct HolidayIngestionReport {
    pub years_attempted: u32,
    pub years_failed: u32,
    pub periods_upserted: u32,
    /// True when the primary date-range call succeeded and the
    /// year-by-year fallback never ran.
    pub used_range_call: bool,
}

/// Fetches the whole configured year range in a single
/// [`HolidayApiClient::fetch_range`] call; if that fails, falls back to
/// fetching each calendar year independently so one year's failure
/// doesn't abort the others.
pub async fn run_holiday_ingestion(client: &HolidayApiClient, repo: &HolidayRepository, years: std::ops::RangeInclusive<i32>) -> Result<HolidayIngestionReport> {
    let mut report = HolidayIngestionReport::default();
    let year_count = (*years.end() - *years.start() + 1).max(0) as u32;

    let range_start = NaiveDate::from_ymd_opt(*years.start(), 1, 1);
    let range_end = NaiveDate::from_ymd_opt(*years.end(), 12, 31);

    let range_entries = match (range_start, range_end) {
        (Some(start), Some(end)) => match client.fetch_range(start, end).await {
            Ok(entries) => {
                report.years_attempted = year_count;
                report.used_range_call = true;
                Some(entries)
            }
            Err(e) => {
                warn!(error = %e, "holiday API date-range call failed, falling back to year-by-year");
                None
            }
        },
        _ => None,
    };

    let entries = match range_entries {
        Some(entries) => entries,
        None => {
            let mut collected = Vec::new();
            for year in years {
                report.years_attempted += 1;
                match client.fetch_year(year).await {
                    Ok(entries) => collected.extend(entries),
                    Err(e) => {
                        warn!(year, error = %e, "holiday API year call failed, skipping");
                        report.years_failed += 1;
                    }
                }
            }
            collected
        }
    };

    report.periods_upserted = upsert_by_period(repo, entries).await?;

    info!(
        years = report.years_attempted,
        failed = report.years_failed,
        periods = report.periods_upserted,
        used_range_call = report.used_range_call,
        "holiday ingestion complete"
    );
    Ok(report)
}

fn group_by_period(entries: Vec<HolidayEntry>) -> HashMap<String, Vec<HolidayEntry>> {
    let mut by_period: HashMap<String, Vec<HolidayEntry>> = HashMap::new();
    for entry in entries {
        let period = format!("{:04}-{:02}", entry.date.year(), entry.date.month());
        by_period.entry(period).or_default().push(entry);
    }
    by_period
}

async fn upsert_by_period(repo: &HolidayRepository, entries: Vec<HolidayEntry>) -> Result<u32> {
    let mut upserted = 0;
    for (period, holidays) in group_by_period(entries) {
        let long_weekends = holidays.iter().filter(|e| is_long_weekend(e.date)).count() as i32;
        let stat = HolidayStat {
            period: period.clone(),
            holidays_count: holidays.len() as i32,
            long_weekends_count: long_weekends,
            holiday_score: holiday_score(&holidays),
            holidays_detail: holidays,
        };
        repo.upsert(stat).await?;
        upserted += 1;
    }
    Ok(upserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HolidayCategory;

    fn entry(y: i32, m: u32, d: u32, name: &str) -> HolidayEntry {
        HolidayEntry { date: NaiveDate::from_ymd_opt(y, m, d).unwrap(), name: name.to_string(), category: HolidayCategory::National }
    }

    #[test]
    fn group_by_period_buckets_entries_by_year_month() {
        let grouped = group_by_period(vec![
            entry(2026, 4, 13, "Songkran"),
            entry(2026, 4, 14, "Songkran"),
            entry(2026, 12, 31, "New Year's Eve"),
        ]);

        assert_eq!(grouped.get("2026-04").map(Vec::len), Some(2));
        assert_eq!(grouped.get("2026-12").map(Vec::len), Some(1));
        assert_eq!(grouped.len(), 2);
    }
}
