//! Storage interface layer: breaks the circular dependency that would
//! otherwise form between the score aggregator, the classifier, and the
//! concrete repositories by giving both only a trait to depend on.
//!
//! [`Storage`] is the single seam the Score Aggregator and the Analysis
//! Orchestrator depend on. [`PgStorage`] is the production
//! implementation, composing the concrete Diesel repositories in
//! `repos/`. [`testing::FixtureStorage`] is an in-memory implementation
//! used by `tests/scenarios.rs` so the end-to-end scenarios run without
//! a Postgres connection.

use anyhow::Result;
use chrono::NaiveDate;

use crate::clients::HolidayApiClient;
use crate::db::PgPool;
use crate::model::{
    Airline, CabinClass, DailyWeatherRow, FlightPrice, HolidayStat, MonthlyWeatherStat, Route,
    RoutePriceStat, TripType,
};
use crate::repos::{
    AirlinesRepository, FlightPriceFilter, FlightPricesRepository, HolidayRepository,
    RoutePriceStatRepository, RoutesRepository, WeatherRepository,
};

/// Everything the Score Aggregator and Analysis Orchestrator need from
/// the storage layer, named so call sites read like domain operations
/// rather than raw SQL.
pub trait Storage: Clone + Send + Sync + 'static {
    fn find_or_create_route(
        &self,
        origin: &str,
        destination: &str,
    ) -> impl Future<Output = Result<Route>> + Send;

    fn available_airlines(&self, route_id: i64) -> impl Future<Output = Result<Vec<Airline>>> + Send;

    fn search_flights(&self, filter: FlightPriceFilter) -> impl Future<Output = Result<Vec<FlightPrice>>> + Send;

    fn cheapest_on_date(
        &self,
        origins: Vec<String>,
        destination: String,
        date: NaiveDate,
        trip_type: TripType,
        cabin: CabinClass,
    ) -> impl Future<Output = Result<Option<FlightPrice>>> + Send;

    fn route_price_stat(&self, route_id: i64, period: &str) -> impl Future<Output = Result<Option<RoutePriceStat>>> + Send;

    /// Every precomputed stat for `route_id`, for callers that need the
    /// whole route rather than one period at a time.
    fn route_price_stats_by_route(&self, route_id: i64) -> impl Future<Output = Result<Vec<RoutePriceStat>>> + Send;

    fn holiday_stat(&self, period: &str) -> impl Future<Output = Result<Option<HolidayStat>>> + Send;

    /// Holiday stats for several periods in one round trip, for callers
    /// that otherwise would look up each period individually.
    fn holiday_stats_by_periods(&self, periods: &[String]) -> impl Future<Output = Result<Vec<HolidayStat>>> + Send;

    fn upsert_holiday_stat(&self, stat: HolidayStat) -> impl Future<Output = Result<()>> + Send;

    fn weather_monthly_stat(&self, province: &str, period: &str) -> impl Future<Output = Result<Option<MonthlyWeatherStat>>> + Send;

    fn weather_daily_range(
        &self,
        province: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<DailyWeatherRow>>> + Send;

    /// The holiday API client, when configured, for the aggregator's
    /// "fetch and upsert" fallback path. `None` means the
    /// upstream API is unreachable/unconfigured for this store.
    fn holiday_api(&self) -> Option<&HolidayApiClient>;
}

/// Production `Storage` backed by the Diesel repositories.
#[derive(Clone)]
pub struct PgStorage {
    routes: RoutesRepository,
    airlines: AirlinesRepository,
    flights: FlightPricesRepository,
    weather: WeatherRepository,
    holidays: HolidayRepository,
    route_price_stats: RoutePriceStatRepository,
    holiday_api: Option<HolidayApiClient>,
}

impl PgStorage {
    pub fn new(pool: PgPool, holiday_api: Option<HolidayApiClient>) -> Self {
        Self {
            routes: RoutesRepository::new(pool.clone()),
            airlines: AirlinesRepository::new(pool.clone()),
            flights: FlightPricesRepository::new(pool.clone()),
            weather: WeatherRepository::new(pool.clone()),
            holidays: HolidayRepository::new(pool.clone()),
            route_price_stats: RoutePriceStatRepository::new(pool),
            holiday_api,
        }
    }
}

impl Storage for PgStorage {
    async fn find_or_create_route(&self, origin: &str, destination: &str) -> Result<Route> {
        crate::db::with_retry(|| self.routes.find_or_create(origin, destination)).await
    }

    async fn available_airlines(&self, route_id: i64) -> Result<Vec<Airline>> {
        crate::db::with_retry(|| self.airlines.available_on_route(route_id)).await
    }

    async fn search_flights(&self, filter: FlightPriceFilter) -> Result<Vec<FlightPrice>> {
        crate::db::with_retry(|| self.flights.search(filter.clone())).await
    }

    async fn cheapest_on_date(
        &self,
        origins: Vec<String>,
        destination: String,
        date: NaiveDate,
        trip_type: TripType,
        cabin: CabinClass,
    ) -> Result<Option<FlightPrice>> {
        crate::db::with_retry(|| self.flights.cheapest_on_date(origins.clone(), destination.clone(), date, trip_type, cabin)).await
    }

    async fn route_price_stat(&self, route_id: i64, period: &str) -> Result<Option<RoutePriceStat>> {
        crate::db::with_retry(|| self.route_price_stats.by_route_and_period(route_id, period)).await
    }

    async fn route_price_stats_by_route(&self, route_id: i64) -> Result<Vec<RoutePriceStat>> {
        crate::db::with_retry(|| self.route_price_stats.by_route(route_id)).await
    }

    async fn holiday_stat(&self, period: &str) -> Result<Option<HolidayStat>> {
        crate::db::with_retry(|| self.holidays.by_period(period)).await
    }

    async fn holiday_stats_by_periods(&self, periods: &[String]) -> Result<Vec<HolidayStat>> {
        crate::db::with_retry(|| self.holidays.by_periods(periods.to_vec())).await
    }

    async fn upsert_holiday_stat(&self, stat: HolidayStat) -> Result<()> {
        crate::db::with_retry(|| self.holidays.upsert(stat.clone())).await
    }

    async fn weather_monthly_stat(&self, province: &str, period: &str) -> Result<Option<MonthlyWeatherStat>> {
        crate::db::with_retry(|| self.weather.monthly_stat(province, period)).await
    }

    async fn weather_daily_range(&self, province: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyWeatherRow>> {
        crate::db::with_retry(|| self.weather.by_province_and_range(province, start, end)).await
    }

    fn holiday_api(&self) -> Option<&HolidayApiClient> {
        self.holiday_api.as_ref()
    }
}

/// In-memory `Storage` fixture for scenario tests. Holds plain `Vec`s
/// seeded directly by the test, with no Postgres connection.
pub mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    pub struct FixtureStorage {
        inner: Arc<Mutex<FixtureState>>,
    }

    #[derive(Default)]
    struct FixtureState {
        next_route_id: i64,
        routes: HashMap<(String, String), Route>,
        flights: Vec<FlightPrice>,
        route_price_stats: HashMap<(i64, String), RoutePriceStat>,
        holiday_stats: HashMap<String, HolidayStat>,
        monthly_weather_stats: HashMap<(String, String), MonthlyWeatherStat>,
        daily_weather: Vec<DailyWeatherRow>,
    }

    impl FixtureStorage {
        pub fn new() -> Self {
            Self { inner: Arc::new(Mutex::new(FixtureState { next_route_id: 1, ..Default::default() })) }
        }

        pub fn seed_flights(&self, flights: Vec<FlightPrice>) {
            self.inner.lock().unwrap().flights.extend(flights);
        }

        pub fn seed_holiday_stat(&self, stat: HolidayStat) {
            self.inner.lock().unwrap().holiday_stats.insert(stat.period.clone(), stat);
        }

        pub fn seed_monthly_weather_stat(&self, stat: MonthlyWeatherStat) {
            self.inner.lock().unwrap().monthly_weather_stats.insert((stat.province.clone(), stat.period.clone()), stat);
        }
    }

    impl Storage for FixtureStorage {
        async fn find_or_create_route(&self, origin: &str, destination: &str) -> Result<Route> {
            let mut state = self.inner.lock().unwrap();
            let key = (origin.to_string(), destination.to_string());
            if let Some(route) = state.routes.get(&key) {
                return Ok(route.clone());
            }
            let id = state.next_route_id;
            state.next_route_id += 1;
            let route = Route { id, origin: origin.to_string(), destination: destination.to_string() };
            state.routes.insert(key, route.clone());
            Ok(route)
        }

        async fn available_airlines(&self, _route_id: i64) -> Result<Vec<Airline>> {
            let state = self.inner.lock().unwrap();
            let mut seen = std::collections::HashSet::new();
            Ok(state
                .flights
                .iter()
                .filter(|f| seen.insert(f.airline.id))
                .map(|f| f.airline.clone())
                .collect())
        }

        async fn search_flights(&self, filter: FlightPriceFilter) -> Result<Vec<FlightPrice>> {
            let state = self.inner.lock().unwrap();
            Ok(state
                .flights
                .iter()
                .filter(|f| filter.origins.contains(&f.route.origin))
                .filter(|f| f.route.destination == filter.destination)
                .filter(|f| f.departure_date >= filter.start_date && f.departure_date <= filter.end_date)
                .filter(|f| f.trip_type == filter.trip_type)
                .filter(|f| f.cabin == filter.cabin)
                .filter(|f| filter.airline_ids.as_ref().is_none_or(|ids| ids.contains(&f.airline.id)))
                .cloned()
                .collect())
        }

        async fn cheapest_on_date(
            &self,
            origins: Vec<String>,
            destination: String,
            date: NaiveDate,
            trip_type: TripType,
            cabin: CabinClass,
        ) -> Result<Option<FlightPrice>> {
            let state = self.inner.lock().unwrap();
            Ok(state
                .flights
                .iter()
                .filter(|f| origins.contains(&f.route.origin))
                .filter(|f| f.route.destination == destination)
                .filter(|f| f.departure_date == date)
                .filter(|f| f.trip_type == trip_type)
                .filter(|f| f.cabin == cabin)
                .min_by(|a, b| a.price.cmp(&b.price))
                .cloned())
        }

        async fn route_price_stat(&self, route_id: i64, period: &str) -> Result<Option<RoutePriceStat>> {
            Ok(self.inner.lock().unwrap().route_price_stats.get(&(route_id, period.to_string())).cloned())
        }

        async fn route_price_stats_by_route(&self, route_id: i64) -> Result<Vec<RoutePriceStat>> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .route_price_stats
                .iter()
                .filter(|((rid, _), _)| *rid == route_id)
                .map(|(_, stat)| stat.clone())
                .collect())
        }

        async fn holiday_stat(&self, period: &str) -> Result<Option<HolidayStat>> {
            Ok(self.inner.lock().unwrap().holiday_stats.get(period).cloned())
        }

        async fn holiday_stats_by_periods(&self, periods: &[String]) -> Result<Vec<HolidayStat>> {
            let state = self.inner.lock().unwrap();
            Ok(periods.iter().filter_map(|p| state.holiday_stats.get(p).cloned()).collect())
        }

        async fn upsert_holiday_stat(&self, stat: HolidayStat) -> Result<()> {
            self.inner.lock().unwrap().holiday_stats.insert(stat.period.clone(), stat);
            Ok(())
        }

        async fn weather_monthly_stat(&self, province: &str, period: &str) -> Result<Option<MonthlyWeatherStat>> {
            Ok(self.inner.lock().unwrap().monthly_weather_stats.get(&(province.to_string(), period.to_string())).cloned())
        }

        async fn weather_daily_range(&self, province: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyWeatherRow>> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .daily_weather
                .iter()
                .filter(|r| r.province == province && r.date >= start && r.date <= end)
                .cloned()
                .collect())
        }

        fn holiday_api(&self) -> Option<&HolidayApiClient> {
            None
        }
    }
}
