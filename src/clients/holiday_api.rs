//! Thai holiday calendar API: one call per year (or a date-range call
//! with a year-by-year fallback), rate-limited to >=200ms between
//! calls.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;

use super::RateLimiter;
use crate::model::{HolidayCategory, HolidayEntry};

#[derive(Clone)]
pub struct HolidayApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct HolidayApiEntry {
    date: NaiveDate,
    name: String,
    #[serde(rename = "type")]
    holiday_type: String,
}

fn map_category(upstream_type: &str) -> Option<HolidayCategory> {
    match upstream_type {
        "public" => Some(HolidayCategory::National),
        "financial" => Some(HolidayCategory::Regional),
        _ => None,
    }
}

impl HolidayApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            limiter: RateLimiter::new(Duration::from_millis(200)),
        }
    }

    pub async fn fetch_year(&self, year: i32) -> Result<Vec<HolidayEntry>> {
        self.limiter.wait().await;
        let url = format!("{}/thai-holiday", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .query(&[("year", year.to_string()), ("holiday_type", "both".to_string())])
            .send()
            .await
            .with_context(|| format!("holiday API request failed for year {year}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("holiday API returned {} for year {year}", response.status()));
        }

        self.parse(response).await
    }

    /// Date-range call, used when the caller wants a span narrower or
    /// wider than a calendar year; the ingestion flow falls back to
    /// [`Self::fetch_year`] per-year if this fails.
    pub async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<HolidayEntry>> {
        self.limiter.wait().await;
        let url = format!("{}/thai-holiday", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .query(&[
                ("start_date", start.format("%Y-%m-%d").to_string()),
                ("end_date", end.format("%Y-%m-%d").to_string()),
                ("holiday_type", "both".to_string()),
            ])
            .send()
            .await
            .context("holiday API date-range request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("holiday API returned {} for range {start}..{end}", response.status()));
        }

        self.parse(response).await
    }

    async fn parse(&self, response: reqwest::Response) -> Result<Vec<HolidayEntry>> {
        let entries: Vec<HolidayApiEntry> = response.json().await.context("invalid holiday API response")?;
        Ok(entries
            .into_iter()
            .filter_map(|e| {
                map_category(&e.holiday_type).map(|category| HolidayEntry { date: e.date, name: e.name, category })
            })
            .collect())
    }
}
