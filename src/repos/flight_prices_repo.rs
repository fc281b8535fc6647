//! Flight price rows filtered by origin set, destination, date range,
//! trip type, optional airline ids, and cabin class — the single
//! query the rest of the analysis path is built on.

use anyhow::Result;
use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::PgPool;
use crate::model::{Airline, CabinClass, FlightMetadata, FlightPrice, Route, TripType};
use crate::schema::{airlines, flight_prices, routes};

#[derive(Clone)]
pub struct FlightPricesRepository {
    pool: PgPool,
}

#[derive(Default, Clone)]
pub struct FlightPriceFilter {
    pub origins: Vec<String>,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trip_type: TripType,
    pub cabin: CabinClass,
    pub airline_ids: Option<Vec<Uuid>>,
}

#[derive(Queryable)]
struct Row {
    route_id: i64,
    route_origin: String,
    route_destination: String,
    airline_id: Uuid,
    airline_code: String,
    airline_display_name: String,
    airline_localized_display_name: String,
    departure_date: NaiveDate,
    return_date: Option<NaiveDate>,
    trip_type: TripType,
    cabin: CabinClass,
    price: bigdecimal::BigDecimal,
    base_price: bigdecimal::BigDecimal,
    season_label: crate::model::Season,
    flight_number: String,
    departure_time: Option<chrono::NaiveTime>,
    arrival_time: Option<chrono::NaiveTime>,
    duration_minutes: Option<i32>,
    airplane: Option<String>,
    carbon_emissions_g: Option<i32>,
    legroom: Option<String>,
    often_delayed: bool,
}

impl From<Row> for FlightPrice {
    fn from(r: Row) -> Self {
        FlightPrice {
            route: Route { id: r.route_id, origin: r.route_origin, destination: r.route_destination },
            airline: Airline {
                id: r.airline_id,
                code: r.airline_code,
                display_name: r.airline_display_name,
                localized_display_name: r.airline_localized_display_name,
            },
            departure_date: r.departure_date,
            return_date: r.return_date,
            trip_type: r.trip_type,
            cabin: r.cabin,
            price: r.price,
            base_price: r.base_price,
            season_label: r.season_label,
            metadata: FlightMetadata {
                flight_number: r.flight_number,
                departure_time: r.departure_time,
                arrival_time: r.arrival_time,
                duration_minutes: r.duration_minutes,
                airplane: r.airplane,
                carbon_emissions_g: r.carbon_emissions_g,
                legroom: r.legroom,
                often_delayed: r.often_delayed,
            },
        }
    }
}

type JoinedSelect = (
    flight_prices::route_id,
    routes::origin,
    routes::destination,
    flight_prices::airline_id,
    airlines::code,
    airlines::display_name,
    airlines::localized_display_name,
    flight_prices::departure_date,
    flight_prices::return_date,
    flight_prices::trip_type,
    flight_prices::cabin,
    flight_prices::price,
    flight_prices::base_price,
    flight_prices::season_label,
    flight_prices::flight_number,
    flight_prices::departure_time,
    flight_prices::arrival_time,
    flight_prices::duration_minutes,
    flight_prices::airplane,
    flight_prices::carbon_emissions_g,
    flight_prices::legroom,
    flight_prices::often_delayed,
);

const SELECT_COLUMNS: JoinedSelect = (
    flight_prices::route_id,
    routes::origin,
    routes::destination,
    flight_prices::airline_id,
    airlines::code,
    airlines::display_name,
    airlines::localized_display_name,
    flight_prices::departure_date,
    flight_prices::return_date,
    flight_prices::trip_type,
    flight_prices::cabin,
    flight_prices::price,
    flight_prices::base_price,
    flight_prices::season_label,
    flight_prices::flight_number,
    flight_prices::departure_time,
    flight_prices::arrival_time,
    flight_prices::duration_minutes,
    flight_prices::airplane,
    flight_prices::carbon_emissions_g,
    flight_prices::legroom,
    flight_prices::often_delayed,
);

impl FlightPricesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn search(&self, filter: FlightPriceFilter) -> Result<Vec<FlightPrice>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;

            let mut query = flight_prices::table
                .inner_join(routes::table.on(flight_prices::route_id.eq(routes::id)))
                .inner_join(airlines::table.on(flight_prices::airline_id.eq(airlines::id)))
                .filter(routes::origin.eq_any(filter.origins.clone()))
                .filter(routes::destination.eq(filter.destination.clone()))
                .filter(flight_prices::departure_date.between(filter.start_date, filter.end_date))
                .filter(flight_prices::trip_type.eq(filter.trip_type))
                .filter(flight_prices::cabin.eq(filter.cabin))
                .select(SELECT_COLUMNS)
                .into_boxed();

            if let Some(ids) = filter.airline_ids.clone() {
                query = query.filter(flight_prices::airline_id.eq_any(ids));
            }

            let rows = query
                .order(flight_prices::departure_date.asc())
                .load::<Row>(&mut conn)?;

            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await?
    }

    /// Cheapest row on an exact date with matching trip type, across the
    /// given origin set and destination (used by the price comparison
    /// and chart-building steps).
    pub async fn cheapest_on_date(
        &self,
        origins: Vec<String>,
        destination: String,
        date: NaiveDate,
        trip_type: TripType,
        cabin: CabinClass,
    ) -> Result<Option<FlightPrice>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let row = flight_prices::table
                .inner_join(routes::table.on(flight_prices::route_id.eq(routes::id)))
                .inner_join(airlines::table.on(flight_prices::airline_id.eq(airlines::id)))
                .filter(routes::origin.eq_any(origins))
                .filter(routes::destination.eq(destination))
                .filter(flight_prices::departure_date.eq(date))
                .filter(flight_prices::trip_type.eq(trip_type))
                .filter(flight_prices::cabin.eq(cabin))
                .select(SELECT_COLUMNS)
                .order(flight_prices::price.asc())
                .first::<Row>(&mut conn)
                .optional()?;
            Ok(row.map(Into::into))
        })
        .await?
    }
}
