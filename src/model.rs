//! Core data types shared across the storage, scoring, and orchestration
//! layers. One named struct per entity, no dynamic row objects or
//! any-typed bags.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveTime};
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "kebab-case")]
#[db_enum(existing_type_path = "crate::schema::sql_types::TripType")]
pub enum TripType {
    OneWay,
    RoundTrip,
}

impl Default for TripType {
    fn default() -> Self {
        TripType::RoundTrip
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "lowercase")]
#[db_enum(existing_type_path = "crate::schema::sql_types::CabinClass")]
pub enum CabinClass {
    Economy,
    Business,
    First,
}

impl Default for CabinClass {
    fn default() -> Self {
        CabinClass::Economy
    }
}

impl CabinClass {
    /// Applied only when storage wasn't already filtered by cabin.
    pub fn multiplier(self) -> f64 {
        match self {
            CabinClass::Economy => 1.0,
            CabinClass::Business => 2.5,
            CabinClass::First => 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "lowercase")]
#[db_enum(existing_type_path = "crate::schema::sql_types::Season")]
pub enum Season {
    Low,
    Normal,
    High,
}

impl Season {
    pub const ORDERED: [Season; 3] = [Season::Low, Season::Normal, Season::High];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "lowercase")]
#[db_enum(existing_type_path = "crate::schema::sql_types::WeatherSource")]
pub enum WeatherSource {
    Historical,
    Forecast,
}

/// (origin, destination) airport-code pair. Created lazily by the first
/// query that mentions it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    pub id: Uuid,
    pub code: String,
    pub display_name: String,
    pub localized_display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightMetadata {
    pub flight_number: String,
    pub departure_time: Option<NaiveTime>,
    pub arrival_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub airplane: Option<String>,
    pub carbon_emissions_g: Option<i32>,
    pub legroom: Option<String>,
    pub often_delayed: bool,
}

/// Invariant: `price` already incorporates seasonal + holiday +
/// variation multipliers applied at ingestion time. Downstream
/// components (scoring, pricing) must never re-derive or re-apply them;
/// they only read `price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightPrice {
    pub route: Route,
    pub airline: Airline,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub trip_type: TripType,
    pub cabin: CabinClass,
    pub price: BigDecimal,
    pub base_price: BigDecimal,
    pub season_label: Season,
    pub metadata: FlightMetadata,
}

impl FlightPrice {
    pub fn period(&self) -> String {
        self.departure_date.format("%Y-%m").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeatherRow {
    pub province: String,
    pub date: NaiveDate,
    pub temp_max: f64,
    pub temp_min: f64,
    pub temp_avg: f64,
    pub precipitation_mm: f64,
    pub humidity: Option<f64>,
    pub source: WeatherSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyWeatherStat {
    pub province: String,
    pub period: String,
    pub avg_temp: f64,
    pub avg_rain: f64,
    pub avg_humidity: Option<f64>,
    pub weather_score: f64,
    pub days_count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayEntry {
    pub date: NaiveDate,
    pub name: String,
    /// Upstream "public" -> national, "financial" -> regional.
    pub category: HolidayCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HolidayCategory {
    National,
    Regional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayStat {
    pub period: String,
    pub holidays_count: i32,
    pub long_weekends_count: i32,
    pub holiday_score: f64,
    pub holidays_detail: Vec<HolidayEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePriceStat {
    pub route_id: i64,
    pub period: String,
    pub price_percentile: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passengers {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl Default for Passengers {
    fn default() -> Self {
        Self { adults: 1, children: 0, infants: 0 }
    }
}
