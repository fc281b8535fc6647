//! Forecasting Engine (C6): lazily trained per-(route, trip_type) GBM
//! models, single-flight coalesced, with confidence bands and a mixed
//! actual+predicted graph.

use std::sync::Arc;

use anyhow::Result;
use bigdecimal::ToPrimitive;
use chrono::{Datelike, NaiveDate, Weekday};
use dashmap::DashMap;
use metrics::{counter, histogram};
use tokio::sync::Mutex;
use tracing::info;

use crate::calendar::seeded_unit_interval;
use crate::forecast::features::{build_features, holiday_multiplier};
use crate::forecast::gbm::{Diagnostics, GbmModel, train_with_cross_validation};
use crate::model::{CabinClass, FlightPrice, HolidayEntry, TripType};

const TRAINING_WINDOW_PAST_DAYS: i64 = 180;
const TRAINING_WINDOW_FUTURE_DAYS: i64 = 60;

/// Below this many matching historical rows, `predict()` reports no
/// model rather than fit on too little data; `graph()` still falls
/// back to the jitter projection either way.
const MIN_ROWS_FOR_PREDICTION: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone)]
pub struct PricePrediction {
    pub date: NaiveDate,
    pub predicted: f64,
    pub low: f64,
    pub high: f64,
    pub confidence: Confidence,
}

#[derive(Debug, Clone)]
pub struct GraphPoint {
    pub date: NaiveDate,
    pub low: f64,
    pub typical: f64,
    pub high: f64,
    pub is_actual: bool,
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct CacheKey {
    origin: String,
    destination: String,
    trip_type: TripType,
}

struct CacheEntry {
    model: Option<GbmModel>,
    diagnostics: Diagnostics,
}

/// One training slot per (route, trip_type), keyed by a `Mutex` so a
/// concurrent re-entrant request coalesces onto the in-flight training
/// instead of starting a second one.
pub struct ForecastingEngine {
    cache: DashMap<CacheKey, Arc<Mutex<Option<CacheEntry>>>>,
}

impl ForecastingEngine {
    pub fn new() -> Self {
        Self { cache: DashMap::new() }
    }

    fn slot(&self, key: &CacheKey) -> Arc<Mutex<Option<CacheEntry>>> {
        self.cache.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(None))).clone()
    }

    /// Ensures a model exists for (origin, destination, trip_type),
    /// training it from `historical` (already filtered to economy-only
    /// flight rows) if absent. Re-entrant calls for the same key block
    /// on the same slot rather than retraining.
    async fn ensure_trained(&self, origin: &str, destination: &str, trip_type: TripType, historical: &[FlightPrice], today: NaiveDate) {
        let key = CacheKey { origin: origin.to_string(), destination: destination.to_string(), trip_type };
        let slot = self.slot(&key);
        let mut guard = slot.lock().await;
        if guard.is_some() {
            return;
        }

        let window_start = today - chrono::Duration::days(TRAINING_WINDOW_PAST_DAYS);
        let window_end = today + chrono::Duration::days(TRAINING_WINDOW_FUTURE_DAYS);
        let training_rows: Vec<&FlightPrice> = historical
            .iter()
            .filter(|f| f.cabin == CabinClass::Economy && f.departure_date >= window_start && f.departure_date <= window_end)
            .collect();

        let rows = if training_rows.is_empty() { historical.iter().collect::<Vec<_>>() } else { training_rows };

        if rows.len() < MIN_ROWS_FOR_PREDICTION {
            *guard = Some(CacheEntry { model: None, diagnostics: Diagnostics::default() });
            counter!("fareseer_forecast_model_unavailable_total").increment(1);
            return;
        }

        let dataset: Vec<(crate::forecast::features::FeatureVector, f64)> = rows
            .iter()
            .map(|f| (build_features(f.departure_date, today, &[]), f.price.to_f64().unwrap_or(0.0)))
            .collect();

        // Below gbm.rs's cross-validation fold minimum, this already
        // degrades to a single in-sample fit.
        let (model, diagnostics) = train_with_cross_validation(&dataset, 100, 6, 0.1);

        histogram!("fareseer_forecast_training_rmse").record(diagnostics.rmse);
        info!(origin, destination, rows = rows.len(), rmse = diagnostics.rmse, mae = diagnostics.mae, "forecast model trained");

        *guard = Some(CacheEntry { model: Some(model), diagnostics });
    }

    /// Predicts a price for a single future date, or `None` if there's
    /// no trained model for this route/trip-type.
    pub async fn predict(
        &self,
        origin: &str,
        destination: &str,
        trip_type: TripType,
        historical: &[FlightPrice],
        holidays: &[HolidayEntry],
        today: NaiveDate,
        date: NaiveDate,
    ) -> Result<Option<PricePrediction>> {
        self.ensure_trained(origin, destination, trip_type, historical, today).await;

        let key = CacheKey { origin: origin.to_string(), destination: destination.to_string(), trip_type };
        let slot = self.slot(&key);
        let guard = slot.lock().await;
        let Some(entry) = guard.as_ref() else { return Ok(None) };
        let Some(model) = &entry.model else { return Ok(None) };

        let features = build_features(date, today, holidays);
        let multiplier = holiday_multiplier(date, holidays);
        let base = model.predict(&features).max(0.0).round();
        let predicted = base * multiplier;

        let days_out = (date - today).num_days();
        let (confidence, band) = if days_out <= 30 {
            (Confidence::High, 0.15)
        } else if days_out <= 60 {
            (Confidence::Medium, 0.20)
        } else {
            (Confidence::Low, 0.25)
        };

        Ok(Some(PricePrediction {
            date,
            predicted,
            low: (predicted * (1.0 - band)).max(0.0),
            high: predicted * (1.0 + band),
            confidence,
        }))
    }

    /// Builds a chart series: actual points for `[today-30, today+30]`,
    /// predicted points for `days` ahead starting tomorrow, skipping any
    /// date already covered by an actual.
    pub async fn graph(
        &self,
        origin: &str,
        destination: &str,
        trip_type: TripType,
        historical: &[FlightPrice],
        holidays: &[HolidayEntry],
        today: NaiveDate,
        days: i64,
    ) -> Result<Vec<GraphPoint>> {
        self.ensure_trained(origin, destination, trip_type, historical, today).await;

        let mut points = Vec::new();
        let mut actual_dates = std::collections::HashSet::new();

        let actual_start = today - chrono::Duration::days(30);
        let actual_end = today + chrono::Duration::days(30);
        for flight in historical.iter().filter(|f| f.departure_date >= actual_start && f.departure_date <= actual_end) {
            if actual_dates.insert(flight.departure_date) {
                let typical = flight.price.to_f64().unwrap_or(0.0);
                points.push(GraphPoint {
                    date: flight.departure_date,
                    low: typical * 0.85,
                    typical,
                    high: typical * 1.30,
                    is_actual: true,
                });
            }
        }

        let historical_avg = {
            let prices: Vec<f64> = historical.iter().filter_map(|f| f.price.to_f64()).collect();
            if prices.is_empty() { 0.0 } else { prices.iter().sum::<f64>() / prices.len() as f64 }
        };

        let key = CacheKey { origin: origin.to_string(), destination: destination.to_string(), trip_type };
        let slot = self.slot(&key);
        let guard = slot.lock().await;
        let model = guard.as_ref().and_then(|e| e.model.as_ref());

        for offset in 1..=days {
            let date = today + chrono::Duration::days(offset);
            if actual_dates.contains(&date) {
                continue;
            }

            let multiplier = holiday_multiplier(date, holidays);
            let weekend_factor = if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) { 1.05 } else { 1.0 };

            let typical = match model {
                Some(m) => {
                    let features = build_features(date, today, holidays);
                    (m.predict(&features).max(0.0).round()) * multiplier
                }
                None => {
                    let jitter_seed = format!("{origin}|{destination}|{date}");
                    let jitter = 0.92 + seeded_unit_interval(&jitter_seed) * (1.08 - 0.92);
                    historical_avg * multiplier * weekend_factor * jitter
                }
            };

            points.push(GraphPoint { date, low: typical * 0.85, typical, high: typical * 1.30, is_actual: false });
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

impl Default for ForecastingEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Airline, CabinClass, Route, Season, FlightMetadata};
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    fn sample_flight(days_from: i64, price: f64) -> FlightPrice {
        let today = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        FlightPrice {
            route: Route { id: 1, origin: "BKK".to_string(), destination: "HKT".to_string() },
            airline: Airline { id: Uuid::nil(), code: "FD".to_string(), display_name: "Test Air".to_string(), localized_display_name: "Test Air".to_string() },
            departure_date: today + chrono::Duration::days(days_from),
            return_date: None,
            trip_type: TripType::RoundTrip,
            cabin: CabinClass::Economy,
            price: BigDecimal::try_from(price).unwrap(),
            base_price: BigDecimal::try_from(price).unwrap(),
            season_label: Season::Normal,
            metadata: FlightMetadata {
                flight_number: "FD1".to_string(),
                departure_time: None,
                arrival_time: None,
                duration_minutes: None,
                airplane: None,
                carbon_emissions_g: None,
                legroom: None,
                often_delayed: false,
            },
        }
    }

    #[tokio::test]
    async fn predict_returns_none_with_no_historical_data() {
        let engine = ForecastingEngine::new();
        let today = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let result = engine
            .predict("BKK", "HKT", TripType::RoundTrip, &[], &[], today, today + chrono::Duration::days(10))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn graph_falls_back_to_jitter_with_sparse_data() {
        let engine = ForecastingEngine::new();
        let today = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let historical = vec![sample_flight(-10, 3000.0), sample_flight(-5, 3200.0)];
        let points = engine.graph("BKK", "HKT", TripType::RoundTrip, &historical, &[], today, 10).await.unwrap();
        assert!(points.iter().all(|p| p.low <= p.typical && p.typical <= p.high));
        assert!(points.iter().all(|p| p.typical >= 0.0));
    }
}
