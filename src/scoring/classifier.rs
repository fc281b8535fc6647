//! Season Classifier (C4): composite season score, tercile split into
//! Low/Normal/High, and per-season price ranges and best deals.

use std::collections::HashMap;

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::model::{FlightPrice, Season};
use crate::scoring::aggregator::PeriodScores;

#[derive(Debug, Clone)]
pub struct BestDeal {
    pub departure_date: chrono::NaiveDate,
    pub price: BigDecimal,
    pub airline_name: String,
}

#[derive(Debug, Clone)]
pub struct SeasonResult {
    pub season: Season,
    pub months: Vec<String>,
    pub price_min: f64,
    pub price_max: f64,
    pub best_deal: Option<BestDeal>,
}

/// `season_score(m) = 0.60 * price_pct + 0.30 * holiday + 0.10 * weather`.
pub fn season_score(scores: &PeriodScores) -> f64 {
    0.60 * scores.price_pct + 0.30 * scores.holiday + 0.10 * scores.weather
}

/// `index = ceil(p/100 * n) - 1`, clamped to 0.
fn percentile_index(n: usize, p: f64) -> usize {
    if n == 0 {
        return 0;
    }
    let raw = (p / 100.0 * n as f64).ceil() as i64 - 1;
    raw.max(0) as usize
}

/// Classifies every month present in `period_scores` (only months with
/// flight data get a score) and returns one [`SeasonResult`] per season
/// that has at least one assigned month.
pub fn classify(period_scores: &HashMap<String, PeriodScores>, flights: &[FlightPrice]) -> Vec<SeasonResult> {
    let mut months: Vec<(&String, f64)> =
        period_scores.iter().map(|(period, scores)| (period, season_score(scores))).collect();
    months.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

    let n = months.len();
    let t33 = months.get(percentile_index(n, 33.0)).map(|(_, s)| *s).unwrap_or(0.0);
    let t67 = months.get(percentile_index(n, 67.0)).map(|(_, s)| *s).unwrap_or(0.0);

    let mut by_season: HashMap<Season, Vec<String>> = HashMap::new();
    for (period, score) in &months {
        // t33 == t67 means every period carries the same score (no
        // spread to split on) — ties between the thresholds resolve to
        // Normal rather than falling through to the Low branch.
        let season = if t33 == t67 {
            Season::Normal
        } else if *score <= t33 {
            Season::Low
        } else if *score >= t67 {
            Season::High
        } else {
            Season::Normal
        };
        by_season.entry(season).or_default().push((*period).clone());
    }

    Season::ORDERED
        .into_iter()
        .filter_map(|season| {
            let mut assigned = by_season.remove(&season)?;
            assigned.sort();

            let matching: Vec<&FlightPrice> = flights.iter().filter(|f| assigned.contains(&f.period())).collect();

            let (price_min, price_max) = if matching.is_empty() {
                (0.0, 0.0)
            } else {
                let prices: Vec<f64> = matching.iter().filter_map(|f| f.price.to_f64()).collect();
                (prices.iter().cloned().fold(f64::MAX, f64::min), prices.iter().cloned().fold(f64::MIN, f64::max))
            };

            let best_deal = matching
                .iter()
                .min_by(|a, b| a.price.cmp(&b.price))
                .map(|f| BestDeal { departure_date: f.departure_date, price: f.price.clone(), airline_name: f.airline.display_name.clone() });

            Some(SeasonResult { season, months: assigned, price_min, price_max, best_deal })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_index_matches_ceil_formula() {
        assert_eq!(percentile_index(10, 33.0), 2);
        assert_eq!(percentile_index(10, 67.0), 6);
        assert_eq!(percentile_index(0, 33.0), 0);
    }

    #[test]
    fn season_score_applies_fixed_weights() {
        let scores = PeriodScores { price_pct: 100.0, holiday: 0.0, weather: 0.0 };
        assert_eq!(season_score(&scores), 60.0);
    }

    #[test]
    fn all_equal_scores_collapse_to_normal_not_low() {
        let flat = PeriodScores { price_pct: 50.0, holiday: 50.0, weather: 50.0 };
        let scores: HashMap<String, PeriodScores> = [
            ("2026-01".to_string(), flat.clone()),
            ("2026-02".to_string(), flat.clone()),
            ("2026-03".to_string(), flat),
        ]
        .into_iter()
        .collect();

        let seasons = classify(&scores, &[]);
        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].season, Season::Normal);
        assert_eq!(seasons[0].months.len(), 3);
    }
}
