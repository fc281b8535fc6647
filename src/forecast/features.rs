//! Feature vector construction for the Forecasting Engine.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::HolidayEntry;

pub const FEATURE_COUNT: usize = 7;

#[derive(Debug, Clone, Copy)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

/// `[dayOfWeek(0-6), month(0-11), daysUntilDeparture, isWeekend,
/// isHolidaySeason, isHoliday, holidayMultiplier]`.
pub fn build_features(date: NaiveDate, today: NaiveDate, holidays: &[HolidayEntry]) -> FeatureVector {
    let day_of_week = date.weekday().num_days_from_monday() as f64;
    let month = (date.month() - 1) as f64;
    let days_until_departure = (date - today).num_days().max(0) as f64;
    let is_weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun) as u8 as f64;
    let is_holiday_season = matches!(date.month(), 12 | 1 | 4) as u8 as f64;
    let is_holiday = holidays.iter().any(|h| h.date == date) as u8 as f64;
    let holiday_multiplier = holiday_multiplier(date, holidays);

    FeatureVector([day_of_week, month, days_until_departure, is_weekend, is_holiday_season, is_holiday, holiday_multiplier])
}

/// 1.5 in Songkran / Christmas-NY windows, 1.4 in New Year window,
/// 1.3 in Chinese New Year, 1.2 in May/October school windows, 1.2
/// within +-3 days of any listed holiday, else 1.0.
pub fn holiday_multiplier(date: NaiveDate, holidays: &[HolidayEntry]) -> f64 {
    if let Some(nearest) = holidays.iter().min_by_key(|h| (h.date - date).num_days().abs()) {
        let delta = (nearest.date - date).num_days().abs();
        if delta == 0 {
            let name = nearest.name.to_lowercase();
            if name.contains("songkran") || name.contains("christmas") {
                return 1.5;
            }
            if name.contains("chinese new year") {
                return 1.3;
            }
            if name.contains("new year") {
                return 1.4;
            }
        }
        if delta <= 3 {
            return 1.2;
        }
    }

    if matches!(date.month(), 5 | 10) {
        return 1.2;
    }

    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HolidayCategory;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn holiday_multiplier_on_songkran_day() {
        let holidays = vec![HolidayEntry { date: date(2026, 4, 13), name: "Songkran Festival".to_string(), category: HolidayCategory::National }];
        assert_eq!(holiday_multiplier(date(2026, 4, 13), &holidays), 1.5);
    }

    #[test]
    fn holiday_multiplier_near_holiday_but_not_on_it() {
        let holidays = vec![HolidayEntry { date: date(2026, 4, 13), name: "Songkran Festival".to_string(), category: HolidayCategory::National }];
        assert_eq!(holiday_multiplier(date(2026, 4, 15), &holidays), 1.2);
    }

    #[test]
    fn holiday_multiplier_school_window_without_holiday() {
        assert_eq!(holiday_multiplier(date(2026, 10, 15), &[]), 1.2);
    }

    #[test]
    fn holiday_multiplier_default_is_one() {
        assert_eq!(holiday_multiplier(date(2026, 3, 2), &[]), 1.0);
    }

    #[test]
    fn build_features_has_expected_length() {
        let f = build_features(date(2026, 4, 13), date(2026, 4, 1), &[]);
        assert_eq!(f.0.len(), FEATURE_COUNT);
    }
}
