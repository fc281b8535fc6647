//! Precomputed price-percentile stats per (route, period). The
//! aggregator consults this before falling back to an on-the-fly
//! computation over the live `flight_prices` table.

use anyhow::Result;
use diesel::prelude::*;

use crate::db::PgPool;
use crate::model::RoutePriceStat;
use crate::schema::route_price_stats;

#[derive(Clone)]
pub struct RoutePriceStatRepository {
    pool: PgPool,
}

#[derive(Queryable)]
struct RoutePriceStatRow {
    route_id: i64,
    period: String,
    price_percentile: f64,
}

impl From<RoutePriceStatRow> for RoutePriceStat {
    fn from(r: RoutePriceStatRow) -> Self {
        RoutePriceStat { route_id: r.route_id, period: r.period, price_percentile: r.price_percentile }
    }
}

impl RoutePriceStatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn by_route_and_period(&self, route_id: i64, period: &str) -> Result<Option<RoutePriceStat>> {
        let pool = self.pool.clone();
        let period = period.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let row = route_price_stats::table
                .filter(route_price_stats::route_id.eq(route_id))
                .filter(route_price_stats::period.eq(period))
                .first::<RoutePriceStatRow>(&mut conn)
                .optional()?;
            Ok(row.map(Into::into))
        })
        .await?
    }

    pub async fn by_route(&self, route_id: i64) -> Result<Vec<RoutePriceStat>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let rows = route_price_stats::table
                .filter(route_price_stats::route_id.eq(route_id))
                .load::<RoutePriceStatRow>(&mut conn)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await?
    }

    pub async fn upsert(&self, stat: RoutePriceStat) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            diesel::insert_into(route_price_stats::table)
                .values((
                    route_price_stats::route_id.eq(stat.route_id),
                    route_price_stats::period.eq(&stat.period),
                    route_price_stats::price_percentile.eq(stat.price_percentile),
                ))
                .on_conflict((route_price_stats::route_id, route_price_stats::period))
                .do_update()
                .set(route_price_stats::price_percentile.eq(stat.price_percentile))
                .execute(&mut conn)?;
            Ok(())
        })
        .await?
    }
}
