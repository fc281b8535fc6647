//! Window expansion: grows a user's date window to at
//! least a rolling 12 months before the classifier and aggregator run.

use chrono::{Datelike, NaiveDate};

const NARROW_WINDOW_DAYS: i64 = 180;

fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total_months = date.year() * 12 + date.month() as i32 - 1 + months;
    let year = total_months.div_euclid(12);
    let month = (total_months.rem_euclid(12) + 1) as u32;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap().pred_opt().unwrap().day()
}

fn end_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), days_in_month(date.year(), date.month())).unwrap()
}

/// Expands `[start, end]` to a wider analysis window, narrow and wide
/// requests handled as two distinct cases (see below).
pub fn expand_window(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let window_days = (end - start).num_days();

    if window_days < NARROW_WINDOW_DAYS {
        let candidate_start = add_months(start, -6);
        let candidate_end = add_months(start, 6);
        let floor = add_months(today, -12);
        (candidate_start.max(floor), candidate_end)
    } else {
        let end_plus_90 = end + chrono::Duration::days(90);
        let end_of_month_plus_6 = end_of_month(add_months(end, 6));
        let new_end = end_plus_90.max(end_of_month_plus_6);
        let new_start = start - chrono::Duration::days(14);
        (new_start, new_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn narrow_window_expands_to_span_around_start() {
        let today = date(2026, 4, 1);
        let (start, end) = expand_window(date(2026, 4, 1), date(2026, 4, 15), today);
        assert_eq!(start, date(2025, 10, 1));
        assert_eq!(end, date(2026, 10, 1));
    }

    #[test]
    fn narrow_window_is_clamped_to_twelve_months_into_the_past() {
        let today = date(2026, 4, 1);
        let (start, _) = expand_window(date(2025, 1, 1), date(2025, 1, 10), today);
        assert_eq!(start, date(2025, 4, 1));
    }

    #[test]
    fn wide_window_extends_end_by_at_least_six_months() {
        let today = date(2026, 4, 1);
        let (start, end) = expand_window(date(2026, 1, 1), date(2026, 9, 1), today);
        assert_eq!(start, date(2025, 12, 18));
        assert_eq!(end, date(2027, 3, 31));
    }
}
