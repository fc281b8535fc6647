//! Route lookup/create by (origin, destination). Routes are
//! write-once/read-mostly: the first query that mentions a route pair
//! creates it.

use anyhow::Result;
use diesel::prelude::*;

use crate::db::PgPool;
use crate::model::Route;
use crate::schema::routes;

#[derive(Clone)]
pub struct RoutesRepository {
    pool: PgPool,
}

#[derive(Queryable)]
struct RouteRow {
    id: i64,
    origin: String,
    destination: String,
    #[allow(dead_code)]
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<RouteRow> for Route {
    fn from(r: RouteRow) -> Self {
        Route { id: r.id, origin: r.origin, destination: r.destination }
    }
}

impl RoutesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_or_create(&self, origin: &str, destination: &str) -> Result<Route> {
        let pool = self.pool.clone();
        let origin = origin.to_string();
        let destination = destination.to_string();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;

            if let Some(existing) = routes::table
                .filter(routes::origin.eq(&origin))
                .filter(routes::destination.eq(&destination))
                .select((routes::id, routes::origin, routes::destination, routes::created_at))
                .first::<RouteRow>(&mut conn)
                .optional()?
            {
                return Ok(existing.into());
            }

            let inserted = diesel::insert_into(routes::table)
                .values((routes::origin.eq(&origin), routes::destination.eq(&destination)))
                .on_conflict((routes::origin, routes::destination))
                .do_update()
                .set(routes::origin.eq(diesel::dsl::sql("routes.origin")))
                .returning((routes::id, routes::origin, routes::destination, routes::created_at))
                .get_result::<RouteRow>(&mut conn)?;

            Ok(inserted.into())
        })
        .await?
    }
}
