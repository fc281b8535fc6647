//! Short-range forecast API: 3-hour steps out to `cnt=40` entries
//! (~5 days), rate-limited to >=1s between provinces.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::RateLimiter;
use crate::model::{DailyWeatherRow, WeatherSource};

#[derive(Clone)]
pub struct WeatherForecastClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt_txt: String,
    main: ForecastMain,
    #[serde(default)]
    rain: Option<ForecastRain>,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp_max: f64,
    temp_min: f64,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastRain {
    #[serde(rename = "3h", default)]
    three_hour: f64,
}

struct DayAccumulator {
    temp_max: f64,
    temp_min: f64,
    precip_mm: f64,
    humidity_sum: f64,
    humidity_count: u32,
}

impl WeatherForecastClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            limiter: RateLimiter::new(Duration::from_secs(1)),
        }
    }

    /// Fetches the raw 3-hour slots and folds them into daily rows.
    /// Filtering to "strictly after D_hist and strictly after today"
    /// is the ingestion flow's job, not the client's.
    pub async fn fetch(&self, province: &str, lat: f64, lon: f64) -> Result<Vec<DailyWeatherRow>> {
        self.limiter.wait().await;

        let url = format!("{}/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("cnt", "40".to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .with_context(|| format!("forecast weather request failed for {province}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("forecast weather API returned {} for {province}", response.status()));
        }

        let parsed: ForecastResponse = response.json().await.context("invalid forecast API response")?;

        let mut by_day: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
        for entry in parsed.list {
            let Ok(dt) = NaiveDateTime::parse_from_str(&entry.dt_txt, "%Y-%m-%d %H:%M:%S") else {
                continue;
            };
            let date = dt.date();
            let acc = by_day.entry(date).or_insert(DayAccumulator {
                temp_max: f64::MIN,
                temp_min: f64::MAX,
                precip_mm: 0.0,
                humidity_sum: 0.0,
                humidity_count: 0,
            });
            acc.temp_max = acc.temp_max.max(entry.main.temp_max);
            acc.temp_min = acc.temp_min.min(entry.main.temp_min);
            acc.precip_mm += entry.rain.map(|r| r.three_hour).unwrap_or(0.0);
            if let Some(h) = entry.main.humidity {
                acc.humidity_sum += h;
                acc.humidity_count += 1;
            }
        }

        Ok(by_day
            .into_iter()
            .map(|(date, acc)| DailyWeatherRow {
                province: province.to_string(),
                date,
                temp_max: acc.temp_max,
                temp_min: acc.temp_min,
                temp_avg: (acc.temp_max + acc.temp_min) / 2.0,
                precipitation_mm: acc.precip_mm,
                humidity: if acc.humidity_count > 0 {
                    Some(acc.humidity_sum / acc.humidity_count as f64)
                } else {
                    None
                },
                source: WeatherSource::Forecast,
            })
            .collect())
    }
}
