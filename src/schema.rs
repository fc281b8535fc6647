// Diesel schema. In a real deployment this is regenerated by
// `diesel print-schema`; committed here by hand to match migrations/.

pub mod sql_types {
    #[derive(diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "trip_type"))]
    pub struct TripType;

    #[derive(diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "cabin_class"))]
    pub struct CabinClass;

    #[derive(diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "season"))]
    pub struct Season;

    #[derive(diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "weather_source"))]
    pub struct WeatherSource;
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::TripType;
    use super::sql_types::CabinClass;
    use super::sql_types::Season;

    routes (id) {
        id -> Int8,
        origin -> Varchar,
        destination -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    airlines (id) {
        id -> Uuid,
        code -> Varchar,
        display_name -> Varchar,
        localized_display_name -> Varchar,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::TripType;
    use super::sql_types::CabinClass;
    use super::sql_types::Season;

    flight_prices (id) {
        id -> Int8,
        route_id -> Int8,
        airline_id -> Uuid,
        departure_date -> Date,
        return_date -> Nullable<Date>,
        trip_type -> TripType,
        cabin -> CabinClass,
        price -> Numeric,
        base_price -> Numeric,
        season_label -> Season,
        flight_number -> Varchar,
        departure_time -> Nullable<Time>,
        arrival_time -> Nullable<Time>,
        duration_minutes -> Nullable<Int4>,
        airplane -> Nullable<Varchar>,
        carbon_emissions_g -> Nullable<Int4>,
        legroom -> Nullable<Varchar>,
        often_delayed -> Bool,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::WeatherSource;

    daily_weather (province, date) {
        province -> Varchar,
        date -> Date,
        temp_max -> Float8,
        temp_min -> Float8,
        temp_avg -> Float8,
        precipitation_mm -> Float8,
        humidity -> Nullable<Float8>,
        source -> WeatherSource,
    }
}

diesel::table! {
    monthly_weather_stats (province, period) {
        province -> Varchar,
        period -> Varchar,
        avg_temp -> Float8,
        avg_rain -> Float8,
        avg_humidity -> Nullable<Float8>,
        weather_score -> Float8,
        days_count -> Int4,
    }
}

diesel::table! {
    holiday_stats (period) {
        period -> Varchar,
        holidays_count -> Int4,
        long_weekends_count -> Int4,
        holiday_score -> Float8,
        holidays_detail -> Jsonb,
    }
}

diesel::table! {
    route_price_stats (route_id, period) {
        route_id -> Int8,
        period -> Varchar,
        price_percentile -> Float8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    routes,
    airlines,
    flight_prices,
    daily_weather,
    monthly_weather_stats,
    holiday_stats,
    route_price_stats,
);
