//! End-to-end scenarios run against `FixtureStorage`, no Postgres
//! required. Mirrors the teacher's integration-test style of exercising
//! the full call graph through public entry points rather than mocking
//! individual repositories.

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use fareseer::forecast::ForecastingEngine;
use fareseer::model::{Airline, CabinClass, FlightMetadata, FlightPrice, Passengers, Route, Season, TripType};
use fareseer::orchestrator::{AnalysisOrchestrator, AnalysisRequest};
use fareseer::storage::Storage;
use fareseer::storage::testing::FixtureStorage;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn flight(departure: NaiveDate, price: f64, trip_type: TripType, airline_code: &str) -> FlightPrice {
    FlightPrice {
        route: Route { id: 1, origin: "BKK".to_string(), destination: "HKT".to_string() },
        airline: Airline {
            id: Uuid::new_v4(),
            code: airline_code.to_string(),
            display_name: format!("{airline_code} Air"),
            localized_display_name: format!("{airline_code} Air"),
        },
        departure_date: departure,
        return_date: if trip_type == TripType::RoundTrip { Some(departure + chrono::Duration::days(7)) } else { None },
        trip_type,
        cabin: CabinClass::Economy,
        price: BigDecimal::from_str(&price.to_string()).unwrap(),
        base_price: BigDecimal::from_str(&price.to_string()).unwrap(),
        season_label: Season::Normal,
        metadata: FlightMetadata {
            flight_number: format!("{airline_code}123"),
            departure_time: None,
            arrival_time: None,
            duration_minutes: Some(90),
            airplane: None,
            carbon_emissions_g: Some(120_000),
            legroom: None,
            often_delayed: false,
        },
    }
}

fn base_request(start_date: Option<NaiveDate>) -> AnalysisRequest {
    AnalysisRequest {
        origin: "Bangkok".to_string(),
        destination: "HKT".to_string(),
        trip_type: TripType::RoundTrip,
        duration_min_days: 5,
        duration_max_days: 9,
        selected_airline_codes: Vec::new(),
        start_date,
        end_date: start_date,
        passengers: Passengers::default(),
        cabin: CabinClass::Economy,
    }
}

fn orchestrator(store: FixtureStorage) -> AnalysisOrchestrator<FixtureStorage> {
    AnalysisOrchestrator::new(store, Arc::new(ForecastingEngine::new()))
}

/// Scenario 1: single-day query with April priced well above
/// the rest of the year puts the anchor date in the high season, with
/// the before/after comparison exactly 7 days either side.
#[tokio::test]
async fn single_day_query_lands_in_high_season_with_week_comparison() {
    let store = FixtureStorage::new();
    store.seed_flights(vec![
        flight(date(2026, 2, 10), 2000.0, TripType::RoundTrip, "FD"),
        flight(date(2026, 6, 10), 2500.0, TripType::RoundTrip, "FD"),
        flight(date(2026, 4, 6), 9000.0, TripType::RoundTrip, "FD"),
        flight(date(2026, 4, 13), 9500.0, TripType::RoundTrip, "FD"),
        flight(date(2026, 4, 20), 9200.0, TripType::RoundTrip, "FD"),
    ]);

    let orchestrator = orchestrator(store);
    let today = date(2026, 4, 13);
    let request = base_request(Some(today));
    let result = orchestrator.analyze(&request, today).await.unwrap();

    assert_eq!(result.recommended_period.season, Season::High);
    assert!(result.recommended_period.savings >= 0);
    assert_eq!(result.price_comparison.if_go_before.date, date(2026, 4, 6));
    assert_eq!(result.price_comparison.if_go_after.date, date(2026, 4, 20));
}

/// Scenario 2: with no weather provider configured and no stored
/// weather rows, the mock weather fallback still produces three
/// seasons, and repeating the query is bit-identical.
#[tokio::test]
async fn missing_weather_provider_still_classifies_three_seasons_deterministically() {
    let store = FixtureStorage::new();
    store.seed_flights(vec![
        flight(date(2026, 2, 10), 2000.0, TripType::RoundTrip, "FD"),
        flight(date(2026, 4, 13), 9000.0, TripType::RoundTrip, "FD"),
        flight(date(2026, 6, 10), 5000.0, TripType::RoundTrip, "FD"),
    ]);
    assert!(store.holiday_api().is_none());

    let orchestrator = orchestrator(store);
    let today = date(2026, 4, 13);
    let request = base_request(Some(today));

    let first = orchestrator.analyze(&request, today).await.unwrap();
    let second = orchestrator.analyze(&request, today).await.unwrap();

    assert_eq!(first.seasons.len(), 3);
    let first_labels: Vec<(Season, Vec<String>)> = first.seasons.iter().map(|s| (s.season_type, s.months.clone())).collect();
    let second_labels: Vec<(Season, Vec<String>)> = second.seasons.iter().map(|s| (s.season_type, s.months.clone())).collect();
    assert_eq!(first_labels, second_labels);
}

/// Scenario 3: a one-way request halves every displayed price relative
/// to the round-trip equivalent, after passenger scaling.
#[tokio::test]
async fn one_way_request_halves_displayed_prices() {
    let departure = date(2026, 4, 13);

    let round_trip_store = FixtureStorage::new();
    round_trip_store.seed_flights(vec![flight(departure, 1000.0, TripType::RoundTrip, "FD")]);
    let round_trip_request = AnalysisRequest { trip_type: TripType::RoundTrip, ..base_request(Some(departure)) };
    let round_trip = orchestrator(round_trip_store).analyze(&round_trip_request, departure).await.unwrap();

    let one_way_store = FixtureStorage::new();
    one_way_store.seed_flights(vec![flight(departure, 1000.0, TripType::OneWay, "FD")]);
    let one_way_request = AnalysisRequest { trip_type: TripType::OneWay, ..base_request(Some(departure)) };
    let one_way = orchestrator(one_way_store).analyze(&one_way_request, departure).await.unwrap();

    assert_eq!(round_trip.flight_prices[0].price, 1000);
    assert_eq!(one_way.flight_prices[0].price, 500);
}

/// Scenario 4: passenger mix {adults:2, children:1, infants:1} against
/// a stored price of 1000 displays as round(1000*2.85) = 2850.
#[tokio::test]
async fn passenger_mix_scales_recommended_price() {
    let departure = date(2026, 4, 13);
    let store = FixtureStorage::new();
    store.seed_flights(vec![flight(departure, 1000.0, TripType::RoundTrip, "FD")]);

    let request = AnalysisRequest {
        passengers: Passengers { adults: 2, children: 1, infants: 1 },
        ..base_request(Some(departure))
    };
    let result = orchestrator(store).analyze(&request, departure).await.unwrap();

    assert_eq!(result.recommended_period.price, 2850);
}

/// Scenario 5: with fewer than five historical rows, `price_prediction`
/// stays absent but `price_graph_data` still covers the full projected
/// window with sane low <= typical <= high ordering.
#[tokio::test]
async fn sparse_history_suppresses_prediction_but_not_the_graph() {
    let today = date(2026, 4, 13);
    let store = FixtureStorage::new();
    store.seed_flights(vec![
        flight(today - chrono::Duration::days(5), 3000.0, TripType::RoundTrip, "FD"),
        flight(today - chrono::Duration::days(2), 3200.0, TripType::RoundTrip, "FD"),
    ]);

    let request = base_request(Some(today));
    let result = orchestrator(store).analyze(&request, today).await.unwrap();

    assert!(result.price_prediction.is_none());
    assert!(!result.price_graph_data.is_empty());
    assert!(result.price_graph_data.iter().all(|p| p.low <= p.typical && p.typical <= p.high));
    assert!(result.price_graph_data.iter().all(|p| p.low >= 0));
}

/// Scenario 6: a holiday landing on Friday April 13 scores at least 95
/// (major festival + long weekend + peak month) and counts as a long
/// weekend for its period.
#[tokio::test]
async fn friday_holiday_scores_at_least_ninety_five() {
    use fareseer::model::{HolidayCategory, HolidayEntry};
    use fareseer::scoring::functions::holiday_score;

    let entries = vec![HolidayEntry { date: date(2026, 4, 13), name: "Songkran Festival".to_string(), category: HolidayCategory::National }];
    assert!(fareseer::calendar::is_long_weekend(entries[0].date));
    assert!(holiday_score(&entries) >= 95.0);
}
