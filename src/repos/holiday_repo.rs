//! Monthly holiday stats, keyed by period. `holidays_detail` is
//! stored as JSONB since it's a variable-length list of heterogeneous
//! holiday entries rather than a relation worth its own table.

use anyhow::Result;
use diesel::prelude::*;

use crate::db::PgPool;
use crate::model::{HolidayEntry, HolidayStat};
use crate::schema::holiday_stats;

#[derive(Clone)]
pub struct HolidayRepository {
    pool: PgPool,
}

#[derive(Queryable)]
struct HolidayStatRow {
    period: String,
    holidays_count: i32,
    long_weekends_count: i32,
    holiday_score: f64,
    holidays_detail: serde_json::Value,
}

impl From<HolidayStatRow> for HolidayStat {
    fn from(r: HolidayStatRow) -> Self {
        let holidays_detail: Vec<HolidayEntry> = serde_json::from_value(r.holidays_detail).unwrap_or_default();
        HolidayStat {
            period: r.period,
            holidays_count: r.holidays_count,
            long_weekends_count: r.long_weekends_count,
            holiday_score: r.holiday_score,
            holidays_detail,
        }
    }
}

impl HolidayRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn by_period(&self, period: &str) -> Result<Option<HolidayStat>> {
        let pool = self.pool.clone();
        let period = period.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let row = holiday_stats::table
                .filter(holiday_stats::period.eq(period))
                .first::<HolidayStatRow>(&mut conn)
                .optional()?;
            Ok(row.map(Into::into))
        })
        .await?
    }

    pub async fn by_periods(&self, periods: Vec<String>) -> Result<Vec<HolidayStat>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let rows = holiday_stats::table
                .filter(holiday_stats::period.eq_any(periods))
                .load::<HolidayStatRow>(&mut conn)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await?
    }

    pub async fn upsert(&self, stat: HolidayStat) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let detail_json = serde_json::to_value(&stat.holidays_detail)?;
            diesel::insert_into(holiday_stats::table)
                .values((
                    holiday_stats::period.eq(&stat.period),
                    holiday_stats::holidays_count.eq(stat.holidays_count),
                    holiday_stats::long_weekends_count.eq(stat.long_weekends_count),
                    holiday_stats::holiday_score.eq(stat.holiday_score),
                    holiday_stats::holidays_detail.eq(&detail_json),
                ))
                .on_conflict(holiday_stats::period)
                .do_update()
                .set((
                    holiday_stats::holidays_count.eq(stat.holidays_count),
                    holiday_stats::long_weekends_count.eq(stat.long_weekends_count),
                    holiday_stats::holiday_score.eq(stat.holiday_score),
                    holiday_stats::holidays_detail.eq(&detail_json),
                ))
                .execute(&mut conn)?;
            Ok(())
        })
        .await?
    }
}
