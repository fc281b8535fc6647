//! CSV import/export for holidays and daily weather. Uses the `csv`
//! crate for RFC-4180 quoting rather than hand-rolled parsing; row
//! shapes mirror the ingestion pipeline's normalized types so a
//! round-tripped file is re-importable as-is.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{DailyWeatherRow, HolidayCategory, HolidayEntry, WeatherSource};

#[derive(Debug, Deserialize, Serialize)]
struct HolidayCsvRow {
    date: NaiveDate,
    name: String,
    category: String,
}

fn category_to_str(category: HolidayCategory) -> &'static str {
    match category {
        HolidayCategory::National => "national",
        HolidayCategory::Regional => "regional",
    }
}

fn category_from_str(s: &str) -> Option<HolidayCategory> {
    match s {
        "national" => Some(HolidayCategory::National),
        "regional" => Some(HolidayCategory::Regional),
        _ => None,
    }
}

/// Reads a `date,name,category` CSV file into [`HolidayEntry`] rows.
/// Rows with an unrecognized `category` are skipped rather than
/// failing the whole import.
pub fn read_holidays(path: impl AsRef<Path>) -> Result<Vec<HolidayEntry>> {
    let mut reader = csv::Reader::from_path(path.as_ref())
        .with_context(|| format!("failed to open {}", path.as_ref().display()))?;

    let mut entries = Vec::new();
    for result in reader.deserialize() {
        let row: HolidayCsvRow = result.context("malformed holiday CSV row")?;
        if let Some(category) = category_from_str(&row.category) {
            entries.push(HolidayEntry { date: row.date, name: row.name, category });
        }
    }
    Ok(entries)
}

pub fn write_holidays(path: impl AsRef<Path>, entries: &[HolidayEntry]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())
        .with_context(|| format!("failed to create {}", path.as_ref().display()))?;
    for entry in entries {
        writer.serialize(HolidayCsvRow {
            date: entry.date,
            name: entry.name.clone(),
            category: category_to_str(entry.category).to_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Deserialize, Serialize)]
struct DailyWeatherCsvRow {
    province: String,
    date: NaiveDate,
    temp_max: f64,
    temp_min: f64,
    temp_avg: f64,
    precipitation_mm: f64,
    humidity: Option<f64>,
    source: String,
}

fn source_to_str(source: WeatherSource) -> &'static str {
    match source {
        WeatherSource::Historical => "historical",
        WeatherSource::Forecast => "forecast",
    }
}

fn source_from_str(s: &str) -> Option<WeatherSource> {
    match s {
        "historical" => Some(WeatherSource::Historical),
        "forecast" => Some(WeatherSource::Forecast),
        _ => None,
    }
}

/// Reads a `province,date,temp_max,temp_min,temp_avg,precipitation_mm,
/// humidity,source` CSV file into [`DailyWeatherRow`]s, skipping rows
/// with an unrecognized `source`.
pub fn read_daily_weather(path: impl AsRef<Path>) -> Result<Vec<DailyWeatherRow>> {
    let mut reader = csv::Reader::from_path(path.as_ref())
        .with_context(|| format!("failed to open {}", path.as_ref().display()))?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: DailyWeatherCsvRow = result.context("malformed daily weather CSV row")?;
        if let Some(source) = source_from_str(&row.source) {
            rows.push(DailyWeatherRow {
                province: row.province,
                date: row.date,
                temp_max: row.temp_max,
                temp_min: row.temp_min,
                temp_avg: row.temp_avg,
                precipitation_mm: row.precipitation_mm,
                humidity: row.humidity,
                source,
            });
        }
    }
    Ok(rows)
}

pub fn write_daily_weather(path: impl AsRef<Path>, rows: &[DailyWeatherRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())
        .with_context(|| format!("failed to create {}", path.as_ref().display()))?;
    for row in rows {
        writer.serialize(DailyWeatherCsvRow {
            province: row.province.clone(),
            date: row.date,
            temp_max: row.temp_max,
            temp_min: row.temp_min,
            temp_avg: row.temp_avg,
            precipitation_mm: row.precipitation_mm,
            humidity: row.humidity,
            source: source_to_str(row.source).to_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holidays_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holidays.csv");
        let entries = vec![
            HolidayEntry {
                date: NaiveDate::from_ymd_opt(2026, 4, 13).unwrap(),
                name: "Songkran".to_string(),
                category: HolidayCategory::National,
            },
            HolidayEntry {
                date: NaiveDate::from_ymd_opt(2026, 4, 14).unwrap(),
                name: "Songkran Day 2".to_string(),
                category: HolidayCategory::Regional,
            },
        ];

        write_holidays(&path, &entries).unwrap();
        let read_back = read_holidays(&path).unwrap();
        assert_eq!(read_back, entries);
    }

    #[test]
    fn daily_weather_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.csv");
        let rows = vec![DailyWeatherRow {
            province: "Phuket".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            temp_max: 33.5,
            temp_min: 26.0,
            temp_avg: 29.75,
            precipitation_mm: 0.0,
            humidity: Some(70.0),
            source: WeatherSource::Historical,
        }];

        write_daily_weather(&path, &rows).unwrap();
        let read_back = read_daily_weather(&path).unwrap();
        assert_eq!(read_back, rows);
    }

    #[test]
    fn unrecognized_category_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "date,name,category\n2026-01-01,New Year,unknown\n").unwrap();
        assert!(read_holidays(&path).unwrap().is_empty());
    }
}
