//! Airline lookup, and "available airlines on a route" (used by the
//! orchestrator's airline filter step).

use anyhow::Result;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::PgPool;
use crate::model::Airline;
use crate::schema::{airlines, flight_prices};

#[derive(Clone)]
pub struct AirlinesRepository {
    pool: PgPool,
}

#[derive(Queryable)]
struct AirlineRow {
    id: Uuid,
    code: String,
    display_name: String,
    localized_display_name: String,
}

impl From<AirlineRow> for Airline {
    fn from(r: AirlineRow) -> Self {
        Airline {
            id: r.id,
            code: r.code,
            display_name: r.display_name,
            localized_display_name: r.localized_display_name,
        }
    }
}

impl AirlinesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Distinct airlines that have ever priced a flight on `route_id`.
    pub async fn available_on_route(&self, route_id: i64) -> Result<Vec<Airline>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let ids: Vec<Uuid> = flight_prices::table
                .filter(flight_prices::route_id.eq(route_id))
                .select(flight_prices::airline_id)
                .distinct()
                .load(&mut conn)?;

            let rows = airlines::table
                .filter(airlines::id.eq_any(ids))
                .select((
                    airlines::id,
                    airlines::code,
                    airlines::display_name,
                    airlines::localized_display_name,
                ))
                .load::<AirlineRow>(&mut conn)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await?
    }
}
