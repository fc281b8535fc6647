//! Bulk archival weather API: one request per (province, calendar-month)
//! chunk, rate-limited to >=200ms between chunks.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use super::RateLimiter;
use crate::model::{DailyWeatherRow, WeatherSource};

#[derive(Clone)]
pub struct WeatherHistoricalClient {
    client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: ArchiveDaily,
}

#[derive(Debug, Deserialize)]
struct ArchiveDaily {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
}

impl WeatherHistoricalClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            limiter: RateLimiter::new(Duration::from_millis(200)),
        }
    }

    /// One (province, calendar-month) chunk. Failures are the caller's
    /// responsibility to log-and-skip.
    pub async fn fetch_month(
        &self,
        province: &str,
        lat: f64,
        lon: f64,
        month_start: NaiveDate,
        month_end: NaiveDate,
    ) -> Result<Vec<DailyWeatherRow>> {
        self.limiter.wait().await;

        let url = format!("{}/archive", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("start_date", month_start.format("%Y-%m-%d").to_string()),
                ("end_date", month_end.format("%Y-%m-%d").to_string()),
                ("daily", "temperature_2m_max,temperature_2m_min,precipitation_sum".to_string()),
                ("timezone", "Asia/Bangkok".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("historical weather request failed for {province}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("historical weather API returned {} for {province}", response.status()));
        }

        let parsed: ArchiveResponse = response.json().await.context("invalid archive API response")?;
        let daily = parsed.daily;

        let mut rows = Vec::with_capacity(daily.time.len());
        for (i, date_str) in daily.time.iter().enumerate() {
            let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
                warn!(date = %date_str, "skipping unparseable archive API date");
                continue;
            };
            let temp_max = daily.temperature_2m_max.get(i).copied().flatten();
            let temp_min = daily.temperature_2m_min.get(i).copied().flatten();
            let precip = daily.precipitation_sum.get(i).copied().flatten().unwrap_or(0.0);

            let (Some(temp_max), Some(temp_min)) = (temp_max, temp_min) else {
                continue;
            };

            rows.push(DailyWeatherRow {
                province: province.to_string(),
                date,
                temp_max,
                temp_min,
                temp_avg: (temp_max + temp_min) / 2.0,
                precipitation_mm: precip,
                humidity: None,
                source: WeatherSource::Historical,
            });
        }

        Ok(rows)
    }
}
