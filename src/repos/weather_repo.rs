//! Daily weather rows and their monthly aggregates.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use diesel::prelude::*;

use crate::db::PgPool;
use crate::model::{DailyWeatherRow, MonthlyWeatherStat, WeatherSource};
use crate::schema::{daily_weather, monthly_weather_stats};

#[derive(Clone)]
pub struct WeatherRepository {
    pool: PgPool,
}

#[derive(Queryable)]
struct DailyRow {
    province: String,
    date: NaiveDate,
    temp_max: f64,
    temp_min: f64,
    temp_avg: f64,
    precipitation_mm: f64,
    humidity: Option<f64>,
    source: WeatherSource,
}

impl From<DailyRow> for DailyWeatherRow {
    fn from(r: DailyRow) -> Self {
        DailyWeatherRow {
            province: r.province,
            date: r.date,
            temp_max: r.temp_max,
            temp_min: r.temp_min,
            temp_avg: r.temp_avg,
            precipitation_mm: r.precipitation_mm,
            humidity: r.humidity,
            source: r.source,
        }
    }
}

#[derive(Queryable)]
struct MonthlyRow {
    province: String,
    period: String,
    avg_temp: f64,
    avg_rain: f64,
    avg_humidity: Option<f64>,
    weather_score: f64,
    days_count: i32,
}

impl From<MonthlyRow> for MonthlyWeatherStat {
    fn from(r: MonthlyRow) -> Self {
        MonthlyWeatherStat {
            province: r.province,
            period: r.period,
            avg_temp: r.avg_temp,
            avg_rain: r.avg_rain,
            avg_humidity: r.avg_humidity,
            weather_score: r.weather_score,
            days_count: r.days_count,
        }
    }
}

impl WeatherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn by_province_and_range(
        &self,
        province: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyWeatherRow>> {
        let pool = self.pool.clone();
        let province = province.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let rows = daily_weather::table
                .filter(daily_weather::province.eq(province))
                .filter(daily_weather::date.between(start, end))
                .order(daily_weather::date.asc())
                .load::<DailyRow>(&mut conn)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await?
    }

    /// Provinces and date ranges already covered by stored daily rows,
    /// so ingestion only requests the missing chunks.
    pub async fn existing_dates(&self, province: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
        let pool = self.pool.clone();
        let province = province.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let dates = daily_weather::table
                .filter(daily_weather::province.eq(province))
                .filter(daily_weather::date.between(start, end))
                .select(daily_weather::date)
                .load::<NaiveDate>(&mut conn)?;
            Ok(dates)
        })
        .await?
    }

    pub async fn upsert_daily(&self, rows: Vec<DailyWeatherRow>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            for row in rows {
                diesel::insert_into(daily_weather::table)
                    .values((
                        daily_weather::province.eq(&row.province),
                        daily_weather::date.eq(row.date),
                        daily_weather::temp_max.eq(row.temp_max),
                        daily_weather::temp_min.eq(row.temp_min),
                        daily_weather::temp_avg.eq(row.temp_avg),
                        daily_weather::precipitation_mm.eq(row.precipitation_mm),
                        daily_weather::humidity.eq(row.humidity),
                        daily_weather::source.eq(row.source),
                    ))
                    .on_conflict((daily_weather::province, daily_weather::date))
                    .do_update()
                    .set((
                        daily_weather::temp_max.eq(row.temp_max),
                        daily_weather::temp_min.eq(row.temp_min),
                        daily_weather::temp_avg.eq(row.temp_avg),
                        daily_weather::precipitation_mm.eq(row.precipitation_mm),
                        daily_weather::humidity.eq(row.humidity),
                        daily_weather::source.eq(row.source),
                    ))
                    .execute(&mut conn)?;
            }
            Ok(())
        })
        .await?
    }

    pub async fn monthly_stat(&self, province: &str, period: &str) -> Result<Option<MonthlyWeatherStat>> {
        let pool = self.pool.clone();
        let province = province.to_string();
        let period = period.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let row = monthly_weather_stats::table
                .filter(monthly_weather_stats::province.eq(province))
                .filter(monthly_weather_stats::period.eq(period))
                .first::<MonthlyRow>(&mut conn)
                .optional()?;
            Ok(row.map(Into::into))
        })
        .await?
    }

    /// Distinct (province, period) pairs that have daily rows — the
    /// full set a statistics refresh recomputes, independent of any
    /// single ingestion run's own touched-period bookkeeping.
    pub async fn distinct_periods(&self, province: &str) -> Result<Vec<String>> {
        let pool = self.pool.clone();
        let province = province.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let dates = daily_weather::table
                .filter(daily_weather::province.eq(province))
                .select(daily_weather::date)
                .distinct()
                .load::<NaiveDate>(&mut conn)?;
            let periods: std::collections::BTreeSet<String> =
                dates.into_iter().map(|d| format!("{:04}-{:02}", d.year(), d.month())).collect();
            Ok(periods.into_iter().collect())
        })
        .await?
    }

    pub async fn upsert_monthly_stat(&self, stat: MonthlyWeatherStat) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            diesel::insert_into(monthly_weather_stats::table)
                .values((
                    monthly_weather_stats::province.eq(&stat.province),
                    monthly_weather_stats::period.eq(&stat.period),
                    monthly_weather_stats::avg_temp.eq(stat.avg_temp),
                    monthly_weather_stats::avg_rain.eq(stat.avg_rain),
                    monthly_weather_stats::avg_humidity.eq(stat.avg_humidity),
                    monthly_weather_stats::weather_score.eq(stat.weather_score),
                    monthly_weather_stats::days_count.eq(stat.days_count),
                ))
                .on_conflict((monthly_weather_stats::province, monthly_weather_stats::period))
                .do_update()
                .set((
                    monthly_weather_stats::avg_temp.eq(stat.avg_temp),
                    monthly_weather_stats::avg_rain.eq(stat.avg_rain),
                    monthly_weather_stats::avg_humidity.eq(stat.avg_humidity),
                    monthly_weather_stats::weather_score.eq(stat.weather_score),
                    monthly_weather_stats::days_count.eq(stat.days_count),
                ))
                .execute(&mut conn)?;
            Ok(())
        })
        .await?
    }
}
