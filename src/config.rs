//! Environment-driven configuration. Loaded once at startup via
//! `dotenvy`, matching the teacher's "env vars + .env for local dev" style.

use anyhow::{Context, Result};
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub iapp_api_key: Option<String>,
    pub iapp_api_url: String,
    pub openweathermap_api_key: Option<String>,
    pub http_interface: String,
    pub http_port: u16,
    /// Historical weather cutover date. Defaults to today
    /// if unset; overridable for deterministic tests and backfills.
    pub d_hist: Option<NaiveDate>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let iapp_api_key = std::env::var("IAPP_API_KEY").ok();
        let iapp_api_url = std::env::var("IAPP_API_URL")
            .unwrap_or_else(|_| "https://iapp.example.com".to_string());
        let openweathermap_api_key = std::env::var("OPENWEATHERMAP_API_KEY").ok();
        let http_interface = std::env::var("HTTP_INTERFACE").unwrap_or_else(|_| "0.0.0.0".to_string());
        let http_port = std::env::var("HTTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let d_hist = std::env::var("D_HIST")
            .ok()
            .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok());

        Ok(Self {
            database_url,
            iapp_api_key,
            iapp_api_url,
            openweathermap_api_key,
            http_interface,
            http_port,
            d_hist,
        })
    }

    pub fn cutover_date(&self) -> NaiveDate {
        self.d_hist.unwrap_or_else(|| chrono::Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutover_date_falls_back_to_today_when_unset() {
        let settings = Settings {
            database_url: "postgres://localhost/test".to_string(),
            iapp_api_key: None,
            iapp_api_url: "https://x".to_string(),
            openweathermap_api_key: None,
            http_interface: "0.0.0.0".to_string(),
            http_port: 8080,
            d_hist: None,
        };
        assert_eq!(settings.cutover_date(), chrono::Utc::now().date_naive());
    }
}
