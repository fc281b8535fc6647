//! Pricing Rules (C7): deterministic transformations applied to every
//! displayed price. Pure functions, no I/O — this module is
//! called from the orchestrator and from the forecaster's output
//! formatting alike.

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::model::{Passengers, TripType};

/// `display(p) = round(A*p + 0.75*C*p + 0.1*I*p)`, halved for one-way
/// trips (stored prices are round-trip for the modeled class). Cabin
/// multipliers are not applied here: storage rows are already
/// cabin-filtered at query time, so applying a multiplier again
/// would double-count it.
pub fn display_price(raw: &BigDecimal, passengers: Passengers, trip_type: TripType) -> i64 {
    let p = raw.to_f64().unwrap_or(0.0);
    let weight = passengers.adults as f64
        + 0.75 * passengers.children as f64
        + 0.1 * passengers.infants as f64;
    let mut total = p * weight;
    if trip_type == TripType::OneWay {
        total /= 2.0;
    }
    total.round() as i64
}

/// Same transform over a plain `f64`, used by the forecaster where
/// prices are already scalar model outputs rather than stored
/// `BigDecimal` rows.
pub fn display_price_f64(raw: f64, passengers: Passengers, trip_type: TripType) -> i64 {
    let weight = passengers.adults as f64
        + 0.75 * passengers.children as f64
        + 0.1 * passengers.infants as f64;
    let mut total = raw * weight;
    if trip_type == TripType::OneWay {
        total /= 2.0;
    }
    total.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn passenger_mix_scales_children_and_infants() {
        let raw = BigDecimal::from_str("1000").unwrap();
        let passengers = Passengers { adults: 2, children: 1, infants: 1 };
        // round(1000 * (2 + 0.75 + 0.1)) = round(2850) = 2850
        assert_eq!(display_price(&raw, passengers, TripType::RoundTrip), 2850);
    }

    #[test]
    fn one_way_halves_the_result() {
        let raw = BigDecimal::from_str("1000").unwrap();
        let passengers = Passengers { adults: 1, children: 0, infants: 0 };
        assert_eq!(display_price(&raw, passengers, TripType::OneWay), 500);
    }

    #[test]
    fn single_adult_round_trip_is_identity() {
        let raw = BigDecimal::from_str("1234").unwrap();
        assert_eq!(
            display_price(&raw, Passengers::default(), TripType::RoundTrip),
            1234
        );
    }
}
