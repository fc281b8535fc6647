//! Weather flow: historical + short-range forecast, merged per
//! province into canonical daily rows and monthly aggregates.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::clients::{WeatherForecastClient, WeatherHistoricalClient};
use crate::geo;
use crate::model::{DailyWeatherRow, MonthlyWeatherStat, WeatherSource};
use crate::repos::WeatherRepository;
use crate::scoring::functions::{estimate_humidity, weather_score};

#[derive(Debug, Default)]
pub struct WeatherIngestionReport {
    pub provinces_attempted: u32,
    pub daily_rows_written: u32,
    pub periods_refreshed: u32,
    pub chunk_failures: u32,
}

pub struct WeatherIngestionClients {
    pub historical: WeatherHistoricalClient,
    pub forecast: Option<WeatherForecastClient>,
}

/// Runs both sub-flows for every configured province across `[start, end]`.
/// Per-(province, chunk) failures are logged and skipped; the run
/// as a whole never aborts on a partial failure.
pub async fn run_weather_ingestion(
    clients: &WeatherIngestionClients,
    repo: &WeatherRepository,
    start: NaiveDate,
    end: NaiveDate,
    cutover: NaiveDate,
    today: NaiveDate,
) -> Result<WeatherIngestionReport> {
    let mut report = WeatherIngestionReport::default();
    let mut touched_periods = std::collections::HashSet::new();

    for (province, lat, lon) in geo::provinces_with_coordinates() {
        report.provinces_attempted += 1;
        let mut rows = Vec::new();

        let historical_end = end.min(cutover);
        if start <= historical_end {
            let existing = repo.existing_dates(province, start, historical_end).await?;
            let existing: std::collections::HashSet<NaiveDate> = existing.into_iter().collect();

            for (month_start, month_end) in month_chunks(start, historical_end) {
                if all_dates_covered(&existing, month_start, month_end) {
                    continue;
                }
                match clients.historical.fetch_month(province, lat, lon, month_start, month_end).await {
                    Ok(mut chunk) => rows.append(&mut chunk),
                    Err(e) => {
                        warn!(province, %month_start, error = %e, "historical weather chunk failed, skipping");
                        report.chunk_failures += 1;
                    }
                }
            }
        }

        if let Some(forecast_client) = &clients.forecast {
            if end > cutover || end > today {
                match forecast_client.fetch(province, lat, lon).await {
                    Ok(forecast_rows) => {
                        rows.extend(
                            forecast_rows
                                .into_iter()
                                .filter(|r| r.date > cutover && r.date > today && r.date >= start && r.date <= end),
                        );
                    }
                    Err(e) => {
                        warn!(province, error = %e, "forecast weather request failed, skipping");
                        report.chunk_failures += 1;
                    }
                }
            }
        }

        if rows.is_empty() {
            continue;
        }

        let normalized = normalize_rows(rows);
        let filtered = drop_forecast_shadowing_historical(repo, province, &normalized).await?;
        report.daily_rows_written += filtered.len() as u32;
        for row in &filtered {
            touched_periods.insert((province.to_string(), format!("{:04}-{:02}", row.date.year(), row.date.month())));
        }
        repo.upsert_daily(filtered).await?;
    }

    for (province, period) in touched_periods {
        refresh_monthly_stat(repo, &province, &period).await?;
        report.periods_refreshed += 1;
    }

    info!(
        provinces = report.provinces_attempted,
        rows = report.daily_rows_written,
        periods = report.periods_refreshed,
        failures = report.chunk_failures,
        "weather ingestion complete"
    );
    Ok(report)
}

fn normalize_rows(rows: Vec<DailyWeatherRow>) -> Vec<DailyWeatherRow> {
    rows.into_iter()
        .map(|mut row| {
            row.temp_avg = round2((row.temp_max + row.temp_min) / 2.0);
            row.temp_max = round2(row.temp_max);
            row.temp_min = round2(row.temp_min);
            row.precipitation_mm = round2(row.precipitation_mm);
            row.humidity = Some(round2(row.humidity.unwrap_or_else(|| estimate_humidity(row.temp_avg, row.precipitation_mm))));
            row
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Historical never loses to forecast for the same (province, date)
///. Rows for dates already stored as
/// `historical` are dropped from a forecast batch before upserting.
async fn drop_forecast_shadowing_historical(
    repo: &WeatherRepository,
    province: &str,
    rows: &[DailyWeatherRow],
) -> Result<Vec<DailyWeatherRow>> {
    let forecast_dates: Vec<NaiveDate> = rows.iter().filter(|r| r.source == WeatherSource::Forecast).map(|r| r.date).collect();
    if forecast_dates.is_empty() {
        return Ok(rows.to_vec());
    }

    let start = *forecast_dates.iter().min().unwrap();
    let end = *forecast_dates.iter().max().unwrap();
    let existing = repo.by_province_and_range(province, start, end).await?;
    let historical_dates: std::collections::HashSet<NaiveDate> =
        existing.into_iter().filter(|r| r.source == WeatherSource::Historical).map(|r| r.date).collect();

    Ok(rows
        .iter()
        .filter(|r| !(r.source == WeatherSource::Forecast && historical_dates.contains(&r.date)))
        .cloned()
        .collect())
}

async fn refresh_monthly_stat(repo: &WeatherRepository, province: &str, period: &str) -> Result<()> {
    let Some((year, month)) = period.split_once('-').and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?))) else {
        return Ok(());
    };
    let Some(start) = NaiveDate::from_ymd_opt(year, month, 1) else { return Ok(()) };
    let next_month = if month == 12 { NaiveDate::from_ymd_opt(year + 1, 1, 1) } else { NaiveDate::from_ymd_opt(year, month + 1, 1) };
    let Some(end) = next_month.and_then(|d| d.pred_opt()) else { return Ok(()) };

    let rows = repo.by_province_and_range(province, start, end).await?;
    if rows.is_empty() {
        return Ok(());
    }

    let n = rows.len() as f64;
    let avg_temp = rows.iter().map(|r| r.temp_avg).sum::<f64>() / n;
    let avg_rain = rows.iter().map(|r| r.precipitation_mm).sum::<f64>();
    let humidities: Vec<f64> = rows.iter().filter_map(|r| r.humidity).collect();
    let avg_humidity = if humidities.is_empty() { None } else { Some(humidities.iter().sum::<f64>() / humidities.len() as f64) };

    repo.upsert_monthly_stat(MonthlyWeatherStat {
        province: province.to_string(),
        period: period.to_string(),
        avg_temp: round2(avg_temp),
        avg_rain: round2(avg_rain),
        avg_humidity: avg_humidity.map(round2),
        weather_score: weather_score(avg_temp, avg_rain, avg_humidity),
        days_count: rows.len() as i32,
    })
    .await
}

fn all_dates_covered(existing: &std::collections::HashSet<NaiveDate>, start: NaiveDate, end: NaiveDate) -> bool {
    let mut d = start;
    while d <= end {
        if !existing.contains(&d) {
            return false;
        }
        d = d.succ_opt().unwrap();
    }
    true
}

/// Recomputes `MonthlyWeatherStat` for every period that has daily rows
/// for `province`, independent of any single ingestion run's own
/// touched-period tracking. Used to backfill stats after a historical
/// CSV import or a change to the scoring function.
pub async fn recompute_monthly_stats(repo: &WeatherRepository, province: &str) -> Result<u32> {
    let periods = repo.distinct_periods(province).await?;
    let mut refreshed = 0;
    for period in &periods {
        refresh_monthly_stat(repo, province, period).await?;
        refreshed += 1;
    }
    Ok(refreshed)
}

fn month_chunks(start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut chunks = Vec::new();
    let mut cursor = NaiveDate::from_ymd_opt(start.year(), start.month(), 1).unwrap();
    while cursor <= end {
        let next = if cursor.month() == 12 {
            NaiveDate::from_ymd_opt(cursor.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(cursor.year(), cursor.month() + 1, 1)
        }
        .unwrap();
        let chunk_end = (next.pred_opt().unwrap()).min(end);
        let chunk_start = cursor.max(start);
        chunks.push((chunk_start, chunk_end));
        cursor = next;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_chunks_splits_across_month_boundaries() {
        let chunks = month_chunks(date(2026, 1, 15), date(2026, 3, 10));
        assert_eq!(
            chunks,
            vec![
                (date(2026, 1, 15), date(2026, 1, 31)),
                (date(2026, 2, 1), date(2026, 2, 28)),
                (date(2026, 3, 1), date(2026, 3, 10)),
            ]
        );
    }

    #[test]
    fn round2_rounds_to_two_decimals() {
        assert_eq!(round2(28.456), 28.46);
    }

    #[test]
    fn all_dates_covered_detects_a_gap() {
        let existing: std::collections::HashSet<NaiveDate> = [date(2026, 1, 1), date(2026, 1, 2), date(2026, 1, 3)].into_iter().collect();
        assert!(all_dates_covered(&existing, date(2026, 1, 1), date(2026, 1, 3)));
        assert!(!all_dates_covered(&existing, date(2026, 1, 1), date(2026, 1, 4)));
    }
}
