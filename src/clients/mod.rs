//! Rate-limited upstream API clients. Each client enforces
//! its own minimum inter-request interval before sending, mirroring the
//! teacher's Nominatim client.

pub mod holiday_api;
pub mod weather_forecast;
pub mod weather_historical;

pub use holiday_api::HolidayApiClient;
pub use weather_forecast::WeatherForecastClient;
pub use weather_historical::WeatherHistoricalClient;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Shared "at most 1 request per `min_interval`" gate. Call
/// [`RateLimiter::wait`] immediately before every request.
#[derive(Clone)]
pub(crate) struct RateLimiter {
    last_request: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self { last_request: Arc::new(Mutex::new(None)), min_interval }
    }

    pub(crate) async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
