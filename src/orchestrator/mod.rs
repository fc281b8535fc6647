//! Analysis Orchestrator: the `AnalyzeFlightPrices` entry point. Fans
//! out to storage and the Score Aggregator / Season Classifier /
//! Forecasting Engine, then applies the pricing rules to every emitted
//! money value.

pub mod aliases;
pub mod window;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::month_index_to_thai;
use crate::error::AnalysisError;
use crate::forecast::{Confidence, ForecastingEngine};
use crate::model::{CabinClass, FlightPrice, HolidayEntry, Passengers, Season, TripType};
use crate::pricing::{display_price, display_price_f64};
use crate::repos::FlightPriceFilter;
use crate::scoring::classifier::{self, SeasonResult};
use crate::scoring::{PeriodScores, ScoreAggregator};
use crate::storage::Storage;

/// `AnalyzeFlightPrices(request)` input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub origin: String,
    pub destination: String,
    pub trip_type: TripType,
    pub duration_min_days: u32,
    pub duration_max_days: u32,
    pub selected_airline_codes: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub passengers: Passengers,
    pub cabin: CabinClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub return_date: NaiveDate,
    pub price: i64,
    pub airline: String,
    pub season: Season,
    pub savings: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestDealDto {
    pub dates: NaiveDate,
    pub price: i64,
    pub airline: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonEntry {
    #[serde(rename = "type")]
    pub season_type: Season,
    pub months: Vec<String>,
    pub price_range: PriceRange,
    pub best_deal: Option<BestDealDto>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSide {
    pub date: NaiveDate,
    pub price: i64,
    pub difference: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceComparison {
    pub base_price: Option<i64>,
    pub base_airline: Option<String>,
    pub if_go_before: ComparisonSide,
    pub if_go_after: ComparisonSide,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartEntry {
    pub start_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub price: i64,
    pub season: Option<Season>,
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePredictionDto {
    pub predicted_price: i64,
    pub confidence: Confidence,
    pub r_squared: f64,
    pub min_price: i64,
    pub max_price: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTrendDto {
    pub trend: Trend,
    pub change_percent: f64,
    pub current_avg_price: i64,
    pub future_avg_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPointDto {
    pub date: NaiveDate,
    pub low: i64,
    pub typical: i64,
    pub high: i64,
    pub is_actual: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightPriceDto {
    pub origin: String,
    pub destination: String,
    pub airline: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub trip_type: TripType,
    pub cabin: CabinClass,
    pub price: i64,
    pub season_label: Season,
    pub flight_number: String,
    pub carbon_emissions_kg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub recommended_period: RecommendedPeriod,
    pub seasons: Vec<SeasonEntry>,
    pub price_comparison: PriceComparison,
    pub price_chart_data: Vec<ChartEntry>,
    pub price_prediction: Option<PricePredictionDto>,
    pub price_trend: Option<PriceTrendDto>,
    pub price_graph_data: Vec<GraphPointDto>,
    pub flight_prices: Vec<FlightPriceDto>,
}

pub struct AnalysisOrchestrator<S: Storage> {
    store: S,
    aggregator: ScoreAggregator<S>,
    forecaster: Arc<ForecastingEngine>,
}

impl<S: Storage> AnalysisOrchestrator<S> {
    pub fn new(store: S, forecaster: Arc<ForecastingEngine>) -> Self {
        let aggregator = ScoreAggregator::new(store.clone());
        Self { store, aggregator, forecaster }
    }

    /// `AnalyzeFlightPrices(request)`.
    pub async fn analyze(&self, request: &AnalysisRequest, today: NaiveDate) -> Result<AnalysisResult, AnalysisError> {
        // Step 1: origin/destination resolution.
        let origin_codes = aliases::resolve(&request.origin, "origin")?;
        let destination_codes = aliases::resolve(&request.destination, "destination")?;
        let destination_code = destination_codes[0].clone();

        let route = self
            .store
            .find_or_create_route(&origin_codes[0], &destination_code)
            .await
            .map_err(AnalysisError::from_storage_error)?;

        // Step 2: airline filter.
        let available = self
            .store
            .available_airlines(route.id)
            .await
            .map_err(AnalysisError::from_storage_error)?;
        let airline_ids = if request.selected_airline_codes.is_empty() {
            None
        } else {
            let ids: Vec<Uuid> = available
                .iter()
                .filter(|a| request.selected_airline_codes.iter().any(|code| code.eq_ignore_ascii_case(&a.code)))
                .map(|a| a.id)
                .collect();
            Some(ids)
        };

        // Step 3: window expansion.
        let user_start = request.start_date.unwrap_or(today);
        let user_end = request.end_date.unwrap_or(user_start + chrono::Duration::days(30));
        let (window_start, window_end) = window::expand_window(user_start, user_end, today);
        let avg_duration_days = (request.duration_min_days as f64 + request.duration_max_days as f64) / 2.0;

        // Step 4: load flight rows.
        let filter = FlightPriceFilter {
            origins: origin_codes.clone(),
            destination: destination_code.clone(),
            start_date: window_start,
            end_date: window_end,
            trip_type: request.trip_type,
            cabin: request.cabin,
            airline_ids,
        };
        let flights = self
            .store
            .search_flights(filter)
            .await
            .map_err(AnalysisError::from_storage_error)?;

        // Step 5: seasons via the Score Aggregator + Season Classifier.
        let period_scores = self
            .aggregator
            .compute(route.id, &destination_code, &flights)
            .await
            .map_err(AnalysisError::from_storage_error)?;
        let seasons = classifier::classify(&period_scores, &flights);

        // Step 6: system recommendation (cheapest best deal across seasons).
        let cheapest_season = seasons
            .iter()
            .filter_map(|s| s.best_deal.as_ref().map(|d| (s, d)))
            .min_by(|(_, a), (_, b)| a.price.cmp(&b.price));

        let (recommended_date, recommended_season_label, recommended_raw_price, recommended_airline) =
            match cheapest_season {
                Some((season, deal)) => (deal.departure_date, season.season, deal.price.clone(), deal.airline_name.clone()),
                None => (user_start, Season::Normal, bigdecimal::BigDecimal::from(0), String::new()),
            };

        // Step 7: recommended end date.
        let recommended_end_date = recommended_date + chrono::Duration::days(avg_duration_days.round() as i64);

        // Step 8: season label shown for the recommendation.
        let anchor = request.start_date.unwrap_or(recommended_date);
        let anchor_season = season_for_date(&seasons, anchor).unwrap_or(recommended_season_label);

        // Step 9: price comparison.
        let anchor_cheapest = self.cheapest_on(&origin_codes, &destination_code, anchor, request).await?;
        let before_date = anchor - chrono::Duration::days(7);
        let after_date = anchor + chrono::Duration::days(7);
        let before_cheapest = self.cheapest_on(&origin_codes, &destination_code, before_date, request).await?;
        let after_cheapest = self.cheapest_on(&origin_codes, &destination_code, after_date, request).await?;

        let price_comparison = build_comparison(
            anchor,
            anchor_cheapest.as_ref().map(|f| display_price(&f.price, request.passengers, request.trip_type)),
            anchor_cheapest.as_ref().map(|f| f.airline.display_name.clone()),
            before_date,
            before_cheapest.as_ref().map(|f| display_price(&f.price, request.passengers, request.trip_type)),
            after_date,
            after_cheapest.as_ref().map(|f| display_price(&f.price, request.passengers, request.trip_type)),
        );

        // Step 10: chart data for the calendar month of the anchor.
        let price_chart_data = self.build_chart(&origin_codes, &destination_code, anchor, &seasons, request).await?;

        // Step 11: savings.
        let recommended_display = display_price(&recommended_raw_price, request.passengers, request.trip_type);
        let savings = if request.start_date.is_some() {
            let anchor_display = anchor_cheapest.as_ref().map(|f| display_price(&f.price, request.passengers, request.trip_type));
            anchor_display.map(|a| (a - recommended_display).max(0)).unwrap_or(0)
        } else {
            let high_best = seasons
                .iter()
                .find(|s| s.season == Season::High)
                .and_then(|s| s.best_deal.as_ref())
                .map(|d| display_price(&d.price, request.passengers, request.trip_type));
            high_best.map(|h| (h - recommended_display).max(0)).unwrap_or(0)
        };

        // Step 12: forecast (optional, errors swallowed rather than surfaced).
        let holidays = self.collect_holidays(&period_scores).await;
        let (price_prediction, price_trend, price_graph_data) =
            self.build_forecast(&origin_codes[0], &destination_code, request, &flights, &holidays, today, anchor).await;

        // Step 13: pricing rules already applied above; build the raw
        // catalog with pricing applied per-row.
        let flight_prices = flights
            .iter()
            .map(|f| FlightPriceDto {
                origin: f.route.origin.clone(),
                destination: f.route.destination.clone(),
                airline: f.airline.display_name.clone(),
                departure_date: f.departure_date,
                return_date: f.return_date,
                trip_type: f.trip_type,
                cabin: f.cabin,
                price: display_price(&f.price, request.passengers, request.trip_type),
                season_label: f.season_label,
                flight_number: f.metadata.flight_number.clone(),
                carbon_emissions_kg: f.metadata.carbon_emissions_g.map(|g| (g as f64 / 1000.0 * 10.0).round() / 10.0),
            })
            .collect();

        let season_entries = seasons
            .into_iter()
            .map(|s| season_result_to_entry(s, request))
            .collect();

        Ok(AnalysisResult {
            recommended_period: RecommendedPeriod {
                start_date: recommended_date,
                end_date: recommended_end_date,
                return_date: recommended_end_date,
                price: recommended_display,
                airline: recommended_airline,
                season: anchor_season,
                savings,
            },
            seasons: season_entries,
            price_comparison,
            price_chart_data,
            price_prediction,
            price_trend,
            price_graph_data,
            flight_prices,
        })
    }

    async fn cheapest_on(
        &self,
        origins: &[String],
        destination: &str,
        date: NaiveDate,
        request: &AnalysisRequest,
    ) -> Result<Option<FlightPrice>, AnalysisError> {
        self.store
            .cheapest_on_date(origins.to_vec(), destination.to_string(), date, request.trip_type, request.cabin)
            .await
            .map_err(AnalysisError::from_storage_error)
    }

    async fn build_chart(
        &self,
        origins: &[String],
        destination: &str,
        anchor: NaiveDate,
        seasons: &[SeasonResult],
        request: &AnalysisRequest,
    ) -> Result<Vec<ChartEntry>, AnalysisError> {
        let days_in_month = days_in_month(anchor.year(), anchor.month());
        let mut entries = Vec::with_capacity(days_in_month as usize);
        for day in 1..=days_in_month {
            let date = NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), day).unwrap();
            let cheapest = self.cheapest_on(origins, destination, date, request).await?;
            let price = cheapest.as_ref().map(|f| display_price(&f.price, request.passengers, request.trip_type)).unwrap_or(0);
            let season = season_for_date(seasons, date);
            entries.push(ChartEntry {
                start_date: date,
                return_date: cheapest.as_ref().and_then(|f| f.return_date),
                price,
                season,
                duration: cheapest.as_ref().and_then(|f| f.metadata.duration_minutes).map(|m| m as i64),
            });
        }
        Ok(entries)
    }

    async fn collect_holidays(&self, period_scores: &HashMap<String, PeriodScores>) -> Vec<HolidayEntry> {
        let periods: Vec<String> = period_scores.keys().cloned().collect();
        self.store
            .holiday_stats_by_periods(&periods)
            .await
            .map(|stats| stats.into_iter().flat_map(|s| s.holidays_detail).collect())
            .unwrap_or_default()
    }

    async fn build_forecast(
        &self,
        origin: &str,
        destination: &str,
        request: &AnalysisRequest,
        flights: &[FlightPrice],
        holidays: &[HolidayEntry],
        today: NaiveDate,
        anchor: NaiveDate,
    ) -> (Option<PricePredictionDto>, Option<PriceTrendDto>, Vec<GraphPointDto>) {
        let prediction = self
            .forecaster
            .predict(origin, destination, request.trip_type, flights, holidays, today, anchor)
            .await
            .ok()
            .flatten()
            .map(|p| PricePredictionDto {
                predicted_price: display_price_f64(p.predicted, request.passengers, request.trip_type),
                confidence: p.confidence,
                r_squared: 0.0,
                min_price: display_price_f64(p.low, request.passengers, request.trip_type),
                max_price: display_price_f64(p.high, request.passengers, request.trip_type),
            });

        let graph = self
            .forecaster
            .graph(origin, destination, request.trip_type, flights, holidays, today, 350)
            .await
            .unwrap_or_default();

        let price_graph_data = graph
            .iter()
            .map(|p| GraphPointDto {
                date: p.date,
                low: display_price_f64(p.low, request.passengers, request.trip_type),
                typical: display_price_f64(p.typical, request.passengers, request.trip_type),
                high: display_price_f64(p.high, request.passengers, request.trip_type),
                is_actual: p.is_actual,
            })
            .collect();

        let current_window: Vec<f64> = graph
            .iter()
            .filter(|p| p.date <= today && p.date >= today - chrono::Duration::days(30))
            .map(|p| p.typical)
            .collect();
        let future_window: Vec<f64> = graph
            .iter()
            .filter(|p| p.date > today && p.date <= today + chrono::Duration::days(30))
            .map(|p| p.typical)
            .collect();

        let trend = if current_window.is_empty() || future_window.is_empty() {
            None
        } else {
            let current_avg = current_window.iter().sum::<f64>() / current_window.len() as f64;
            let future_avg = future_window.iter().sum::<f64>() / future_window.len() as f64;
            let change_percent = if current_avg > 0.0 { 100.0 * (future_avg - current_avg) / current_avg } else { 0.0 };
            let trend = if change_percent > 2.0 {
                Trend::Increasing
            } else if change_percent < -2.0 {
                Trend::Decreasing
            } else {
                Trend::Stable
            };
            Some(PriceTrendDto {
                trend,
                change_percent,
                current_avg_price: display_price_f64(current_avg, request.passengers, request.trip_type),
                future_avg_price: display_price_f64(future_avg, request.passengers, request.trip_type),
            })
        };

        (prediction, trend, price_graph_data)
    }
}

fn season_result_to_entry(season: SeasonResult, request: &AnalysisRequest) -> SeasonEntry {
    let months: Vec<String> = season
        .months
        .iter()
        .filter_map(|period| {
            let month: u32 = period.split('-').nth(1)?.parse().ok()?;
            month_index_to_thai(month).map(|s| s.to_string())
        })
        .collect();

    let best_deal = season.best_deal.map(|d| BestDealDto {
        dates: d.departure_date,
        price: display_price(&d.price, request.passengers, request.trip_type),
        airline: d.airline_name,
    });

    let description = match season.season {
        Season::Low => "Lower demand, lower prices — the best time to find a bargain.".to_string(),
        Season::Normal => "Typical demand and pricing for this route.".to_string(),
        Season::High => "Peak demand — expect higher prices and busier flights.".to_string(),
    };

    SeasonEntry {
        season_type: season.season,
        months,
        price_range: PriceRange {
            min: display_price_f64(season.price_min, request.passengers, request.trip_type),
            max: display_price_f64(season.price_max, request.passengers, request.trip_type),
        },
        best_deal,
        description,
    }
}

fn season_for_date(seasons: &[SeasonResult], date: NaiveDate) -> Option<Season> {
    let period = date.format("%Y-%m").to_string();
    seasons.iter().find(|s| s.months.contains(&period)).map(|s| s.season)
}

#[allow(clippy::too_many_arguments)]
fn build_comparison(
    anchor: NaiveDate,
    anchor_price: Option<i64>,
    anchor_airline: Option<String>,
    before_date: NaiveDate,
    before_price: Option<i64>,
    after_date: NaiveDate,
    after_price: Option<i64>,
) -> PriceComparison {
    let side = |date: NaiveDate, price: Option<i64>| -> ComparisonSide {
        match (anchor_price, price) {
            (Some(a), Some(p)) => ComparisonSide {
                date,
                price: p,
                difference: p - a,
                percentage: if a != 0 { 100.0 * (p - a) as f64 / a as f64 } else { 0.0 },
            },
            (None, Some(p)) => {
                // Anchor missing: if both neighbors exist, their mean is
                // the reference; if only this one exists,
                // report the other side as 0%.
                ComparisonSide { date, price: p, difference: 0, percentage: 0.0 }
            }
            (_, None) => ComparisonSide { date, price: 0, difference: 0, percentage: 0.0 },
        }
    };

    let (before, after) = match (anchor_price, before_price, after_price) {
        (None, Some(b), Some(a)) => {
            let reference = (b + a) / 2;
            let pct = |p: i64| if reference != 0 { 100.0 * (p - reference) as f64 / reference as f64 } else { 0.0 };
            (
                ComparisonSide { date: before_date, price: b, difference: b - reference, percentage: pct(b) },
                ComparisonSide { date: after_date, price: a, difference: a - reference, percentage: pct(a) },
            )
        }
        _ => (side(before_date, before_price), side(after_date, after_price)),
    };

    PriceComparison {
        base_price: anchor_price,
        base_airline: anchor_airline,
        if_go_before: before,
        if_go_after: after,
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap().pred_opt().unwrap().day()
}
