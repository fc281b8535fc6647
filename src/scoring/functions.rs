//! Pure scoring functions shared by ingestion and the aggregator.

use chrono::Datelike;

use crate::model::{HolidayCategory, HolidayEntry};

const MAJOR_FESTIVAL_MARKERS: [&str; 4] = ["songkran", "chinese new year", "new year", "christmas"];
const IMPORTANT_HOLIDAY_MARKERS: [&str; 5] = ["makha", "visakha", "asanha", "royal birthday", "mother", "father"];

fn name_matches_any(name: &str, markers: &[&str]) -> bool {
    let lower = name.to_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

/// Starts at 50, classifies each entry by name, adds a long-weekend
/// bonus, adds a December/January/April peak-month bonus, clamps to
/// [0,100].
pub fn holiday_score(holidays: &[HolidayEntry]) -> f64 {
    let mut score = 50.0;
    let mut any_peak_month = false;

    for entry in holidays {
        if name_matches_any(&entry.name, &MAJOR_FESTIVAL_MARKERS) {
            score += 20.0;
        } else if name_matches_any(&entry.name, &IMPORTANT_HOLIDAY_MARKERS) {
            score += 10.0;
        } else if matches!(entry.category, HolidayCategory::National) {
            score += 8.0;
        } else {
            score += 5.0;
        }

        if crate::calendar::is_long_weekend(entry.date) {
            score += 5.0;
        }

        if matches!(entry.date.month(), 12 | 1 | 4) {
            any_peak_month = true;
        }
    }

    if any_peak_month {
        score += 20.0;
    }

    score.clamp(0.0, 100.0)
}

/// Monthly weather score from average temperature, rainfall, and
/// humidity.
pub fn weather_score(avg_temp: f64, avg_rain: f64, avg_humidity: Option<f64>) -> f64 {
    let mut score = 50.0;

    if (20.0..=28.0).contains(&avg_temp) {
        score += 20.0;
    } else if !(20.0..=32.0).contains(&avg_temp) {
        score -= 20.0;
    }

    if avg_rain < 50.0 {
        score += 15.0;
    } else if avg_rain > 200.0 {
        score -= 15.0;
    }

    if let Some(h) = avg_humidity {
        if (50.0..=70.0).contains(&h) {
            score += 15.0;
        } else if h > 80.0 {
            score -= 15.0;
        }
    }

    score.clamp(0.0, 100.0)
}

/// Per-day humidity estimate, used during ingestion when the upstream
/// API doesn't report humidity: base 70, temperature penalty, rain
/// bonus, clamped to [50, 90].
pub fn estimate_humidity(temp_avg: f64, precipitation_mm: f64) -> f64 {
    let estimate = 70.0 - 1.5 * (temp_avg - 28.0) + (3.0 * precipitation_mm).min(15.0);
    estimate.clamp(50.0, 90.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HolidayCategory;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn holiday_score_major_festival_on_long_weekend_in_peak_month() {
        // 2026-04-13 is a Monday (long weekend) in April (peak month).
        let entries = vec![HolidayEntry {
            date: date(2026, 4, 13),
            name: "Songkran Festival".to_string(),
            category: HolidayCategory::National,
        }];
        // 50 (base) + 20 (major) + 5 (long weekend) + 20 (peak month) = 95
        assert_eq!(holiday_score(&entries), 95.0);
    }

    #[test]
    fn holiday_score_clamps_to_100() {
        let entries = vec![
            HolidayEntry { date: date(2026, 4, 13), name: "Songkran Festival".to_string(), category: HolidayCategory::National },
            HolidayEntry { date: date(2026, 4, 14), name: "Songkran Day 2".to_string(), category: HolidayCategory::National },
            HolidayEntry { date: date(2026, 4, 15), name: "Songkran Day 3".to_string(), category: HolidayCategory::National },
        ];
        assert_eq!(holiday_score(&entries), 100.0);
    }

    #[test]
    fn holiday_score_regular_public_holiday() {
        let entries = vec![HolidayEntry {
            date: date(2026, 7, 1), // Wednesday, not a long weekend, not a peak month
            name: "Mid-Year Bank Holiday".to_string(),
            category: HolidayCategory::National,
        }];
        assert_eq!(holiday_score(&entries), 58.0);
    }

    #[test]
    fn weather_score_comfortable_dry_band() {
        assert_eq!(weather_score(24.0, 20.0, Some(60.0)), 100.0);
    }

    #[test]
    fn weather_score_hot_and_wet() {
        // Outside 20-32 band: -20; rain > 200: -15; humidity > 80: -15
        assert_eq!(weather_score(35.0, 250.0, Some(90.0)), 0.0);
    }

    #[test]
    fn estimate_humidity_clamps() {
        assert!((estimate_humidity(28.0, 0.0) - 70.0).abs() < 1e-9);
        assert_eq!(estimate_humidity(50.0, 0.0), 50.0);
        assert_eq!(estimate_humidity(0.0, 100.0), 90.0);
    }
}
