pub mod airlines_repo;
pub mod flight_prices_repo;
pub mod holiday_repo;
pub mod route_price_stat_repo;
pub mod routes_repo;
pub mod weather_repo;

pub use airlines_repo::AirlinesRepository;
pub use flight_prices_repo::{FlightPriceFilter, FlightPricesRepository};
pub use holiday_repo::HolidayRepository;
pub use route_price_stat_repo::RoutePriceStatRepository;
pub use routes_repo::RoutesRepository;
pub use weather_repo::WeatherRepository;
