//! Score Aggregator (C3): one `PeriodScores` per period present in a
//! query's flight rows, preferring precomputed stats, then on-the-fly
//! aggregation, then a deterministic fabricated proxy.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::calendar::seeded_unit_interval;
use crate::geo;
use crate::model::{FlightPrice, HolidayStat};
use crate::scoring::functions::{holiday_score, weather_score};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodScores {
    pub price_pct: f64,
    pub holiday: f64,
    pub weather: f64,
}

/// Generic over [`Storage`] so it depends only on the interface layer
///, not on concrete Diesel repositories — the same
/// aggregator runs against `PgStorage` in production and
/// `FixtureStorage` in scenario tests.
pub struct ScoreAggregator<S: Storage> {
    pub store: S,
}

impl<S: Storage> ScoreAggregator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// `flights` must already be restricted to the query's window.
    pub async fn compute(
        &self,
        route_id: i64,
        destination_code: &str,
        flights: &[FlightPrice],
    ) -> Result<HashMap<String, PeriodScores>> {
        let monthly_avg = monthly_average_prices(flights);
        let periods: Vec<String> = monthly_avg.keys().cloned().collect();

        let price_pcts = self.price_percentiles(route_id, &monthly_avg).await?;
        let holiday_scores = self.holiday_scores(&periods, &monthly_avg).await?;
        let weather_scores = self.weather_scores(destination_code, route_id, &periods, &monthly_avg).await?;

        Ok(periods
            .into_iter()
            .map(|period| {
                let scores = PeriodScores {
                    price_pct: *price_pcts.get(&period).unwrap_or(&50.0),
                    holiday: *holiday_scores.get(&period).unwrap_or(&50.0),
                    weather: *weather_scores.get(&period).unwrap_or(&50.0),
                };
                (period, scores)
            })
            .collect())
    }

    async fn price_percentiles(
        &self,
        route_id: i64,
        monthly_avg: &HashMap<String, f64>,
    ) -> Result<HashMap<String, f64>> {
        let mut out = HashMap::new();
        let mut fallback_needed = Vec::new();

        let precomputed: HashMap<String, f64> =
            self.store.route_price_stats_by_route(route_id).await?.into_iter().map(|s| (s.period, s.price_percentile)).collect();
        for period in monthly_avg.keys() {
            match precomputed.get(period) {
                Some(pct) => {
                    out.insert(period.clone(), *pct);
                }
                None => fallback_needed.push(period.clone()),
            }
        }

        if !fallback_needed.is_empty() {
            let n = monthly_avg.len() as f64;
            let mut avgs: Vec<f64> = monthly_avg.values().copied().collect();
            avgs.sort_by(|a, b| a.partial_cmp(b).unwrap());

            for period in fallback_needed {
                let avg = monthly_avg[&period];
                let rank = avgs.iter().filter(|&&v| v <= avg).count() as f64;
                out.insert(period, 100.0 * rank / n);
            }
        }

        Ok(out)
    }

    async fn holiday_scores(
        &self,
        periods: &[String],
        monthly_avg: &HashMap<String, f64>,
    ) -> Result<HashMap<String, f64>> {
        let mut out = HashMap::new();
        let mut fallback_needed = Vec::new();

        let precomputed: HashMap<String, f64> =
            self.store.holiday_stats_by_periods(periods).await?.into_iter().map(|s| (s.period, s.holiday_score)).collect();
        for period in periods {
            match precomputed.get(period) {
                Some(score) => {
                    out.insert(period.clone(), *score);
                }
                None => fallback_needed.push(period.clone()),
            }
        }

        if let Some(client) = self.store.holiday_api() {
            let mut still_missing = Vec::new();
            for period in fallback_needed {
                match self.fetch_and_upsert_holiday_stat(client, &period).await {
                    Ok(Some(stat)) => {
                        out.insert(period, stat.holiday_score);
                    }
                    Ok(None) | Err(_) => still_missing.push(period),
                }
            }
            fallback_needed = still_missing;
        }

        if !fallback_needed.is_empty() {
            let (min, max) = min_max(monthly_avg.values().copied());
            for period in fallback_needed {
                let avg = monthly_avg.get(&period).copied().unwrap_or(0.0);
                let unit = normalize(avg, min, max);
                let base = 35.0 + unit * 60.0;
                let jitter = (seeded_unit_interval(&period) * 2.0 - 1.0) * 20.0;
                out.insert(period, (base + jitter).clamp(0.0, 100.0));
            }
        }

        Ok(out)
    }

    async fn fetch_and_upsert_holiday_stat(&self, client: &crate::clients::HolidayApiClient, period: &str) -> Result<Option<HolidayStat>> {
        let Some((year, _month)) = parse_period(period) else {
            return Ok(None);
        };
        let entries = client.fetch_year(year).await?;
        let month_entries: Vec<_> = entries
            .into_iter()
            .filter(|e| format!("{:04}-{:02}", e.date.year(), e.date.month()) == period)
            .collect();
        if month_entries.is_empty() {
            debug!(period, "holiday API returned no entries for period");
            return Ok(None);
        }

        let long_weekends = month_entries.iter().filter(|e| crate::calendar::is_long_weekend(e.date)).count() as i32;
        let stat = HolidayStat {
            period: period.to_string(),
            holidays_count: month_entries.len() as i32,
            long_weekends_count: long_weekends,
            holiday_score: holiday_score(&month_entries),
            holidays_detail: month_entries,
        };
        self.store.upsert_holiday_stat(stat.clone()).await?;
        Ok(Some(stat))
    }

    async fn weather_scores(
        &self,
        destination_code: &str,
        route_id: i64,
        periods: &[String],
        monthly_avg: &HashMap<String, f64>,
    ) -> Result<HashMap<String, f64>> {
        let mut out = HashMap::new();

        let Some(province) = geo::province_for_airport(destination_code) else {
            for period in periods {
                out.insert(period.clone(), 50.0);
            }
            return Ok(out);
        };

        for period in periods {
            if let Some(stat) = self.store.weather_monthly_stat(province, period).await? {
                out.insert(period.clone(), stat.weather_score);
                continue;
            }

            if let Some((year, month)) = parse_period(period) {
                if let (Some(start), Some(end)) = (
                    NaiveDate::from_ymd_opt(year, month, 1),
                    last_day_of_month(year, month),
                ) {
                    let rows = self.store.weather_daily_range(province, start, end).await?;
                    if !rows.is_empty() {
                        let n = rows.len() as f64;
                        let avg_temp = rows.iter().map(|r| r.temp_avg).sum::<f64>() / n;
                        let avg_rain = rows.iter().map(|r| r.precipitation_mm).sum::<f64>();
                        let humidities: Vec<f64> = rows.iter().filter_map(|r| r.humidity).collect();
                        let avg_humidity =
                            if humidities.is_empty() { None } else { Some(humidities.iter().sum::<f64>() / humidities.len() as f64) };
                        out.insert(period.clone(), weather_score(avg_temp, avg_rain, avg_humidity));
                        continue;
                    }
                }
            }

            let (min, max) = min_max(monthly_avg.values().copied());
            let avg = monthly_avg.get(period).copied().unwrap_or(0.0);
            let _ = normalize(avg, min, max);
            let seed = format!("{period}|{route_id}");
            out.insert(period.clone(), 30.0 + seeded_unit_interval(&seed) * 60.0);
        }

        Ok(out)
    }
}

fn monthly_average_prices(flights: &[FlightPrice]) -> HashMap<String, f64> {
    let mut sums: HashMap<String, (f64, u32)> = HashMap::new();
    for flight in flights {
        let entry = sums.entry(flight.period()).or_insert((0.0, 0));
        entry.0 += flight.price.to_string().parse::<f64>().unwrap_or(0.0);
        entry.1 += 1;
    }
    sums.into_iter().map(|(period, (sum, count))| (period, sum / count as f64)).collect()
}

fn parse_period(period: &str) -> Option<(i32, u32)> {
    let mut parts = period.split('-');
    let year = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    Some((year, month))
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::MAX, f64::MIN), |(min, max), v| (min.min(v), max.max(v)))
}

fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max > min { (value - min) / (max - min) } else { 0.5 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_equal_min_max() {
        assert_eq!(normalize(10.0, 10.0, 10.0), 0.5);
    }

    #[test]
    fn parse_period_roundtrips() {
        assert_eq!(parse_period("2026-04"), Some((2026, 4)));
        assert_eq!(parse_period("not-a-period"), None);
    }

    #[test]
    fn last_day_of_month_handles_december() {
        assert_eq!(last_day_of_month(2026, 12), NaiveDate::from_ymd_opt(2026, 12, 31));
    }
}
