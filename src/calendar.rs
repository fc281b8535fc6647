//! Calendar utilities (C8): long-weekend detection, Thai month-name
//! mapping, and the deterministic seeded PRNG used everywhere a signal
//! is missing and a reproducible fallback is needed.

use chrono::{Datelike, NaiveDate, Weekday};

/// True if `d` is a Friday or Monday, or either adjacent day falls on a
/// weekend.
pub fn is_long_weekend(d: NaiveDate) -> bool {
    match d.weekday() {
        Weekday::Fri | Weekday::Mon => return true,
        _ => {}
    }
    let prev = d.pred_opt().map(|p| p.weekday());
    let next = d.succ_opt().map(|n| n.weekday());
    matches!(prev, Some(Weekday::Sat) | Some(Weekday::Sun))
        || matches!(next, Some(Weekday::Sat) | Some(Weekday::Sun))
}

const THAI_MONTH_NAMES: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

/// 1-based month index for a Thai month name. Tries an exact match
/// first, then falls back to substring containment either way.
pub fn thai_month_to_index(name: &str) -> Option<u32> {
    let name = name.trim();
    if let Some(pos) = THAI_MONTH_NAMES.iter().position(|m| *m == name) {
        return Some(pos as u32 + 1);
    }
    THAI_MONTH_NAMES
        .iter()
        .position(|m| m.contains(name) || name.contains(*m))
        .map(|pos| pos as u32 + 1)
}

/// 1-based month index (1..=12) -> Thai month name.
pub fn month_index_to_thai(index: u32) -> Option<&'static str> {
    THAI_MONTH_NAMES.get(index.checked_sub(1)? as usize).copied()
}

/// 32-bit rolling hash of a seed string: `h = ((h << 5) - h + c_i)`,
/// matching the reference's Java-style `String.hashCode`-derived
/// fallback generator. Returns a value in `[0, 1)`.
///
/// Used by the Score Aggregator's fabricated price/holiday/weather
/// scores and by the Forecasting Engine's fallback jitter term, so
/// repeated queries with the same seed are bit-identical across runs
/// and processes.
pub fn seeded_unit_interval(seed: &str) -> f64 {
    let mut h: i32 = 0;
    for c in seed.chars() {
        h = h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as i32);
    }
    (h.unsigned_abs() as u64 % 1_000_000) as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn long_weekend_friday_and_monday() {
        // 2026-04-13 is a Monday.
        assert!(is_long_weekend(date(2026, 4, 13)));
        // 2026-04-10 is a Friday.
        assert!(is_long_weekend(date(2026, 4, 10)));
    }

    #[test]
    fn long_weekend_adjacent_to_weekend() {
        // 2026-04-16 is a Thursday; 2026-04-17 (Friday->no, check Fri separately)
        // Use a Tuesday adjacent to Monday which is itself adjacent to Sunday: not long weekend unless Fri/Mon or bordering Sat/Sun.
        let tuesday = date(2026, 4, 14); // Tuesday, prev=Mon, next=Wed -> not long weekend
        assert!(!is_long_weekend(tuesday));
    }

    #[test]
    fn long_weekend_midweek_false() {
        // 2026-04-15 is a Wednesday, flanked by Tue/Thu.
        assert!(!is_long_weekend(date(2026, 4, 15)));
    }

    #[test]
    fn thai_month_roundtrip() {
        for i in 1..=12u32 {
            let name = month_index_to_thai(i).unwrap();
            assert_eq!(thai_month_to_index(name), Some(i));
        }
    }

    #[test]
    fn thai_month_substring_match() {
        assert_eq!(thai_month_to_index("เมษายน "), Some(4));
    }

    #[test]
    fn seeded_unit_interval_is_deterministic() {
        let a = seeded_unit_interval("2026-04");
        let b = seeded_unit_interval("2026-04");
        assert_eq!(a, b);
        assert!((0.0..1.0).contains(&a));
    }

    #[test]
    fn seeded_unit_interval_varies_by_seed() {
        assert_ne!(
            seeded_unit_interval("2026-04|BKK-HKT"),
            seeded_unit_interval("2026-05|BKK-HKT")
        );
    }
}
