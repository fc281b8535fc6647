//! Forecasting Engine: lazily trained per-route price models with
//! confidence bands and a combined actual/predicted graph.

pub mod engine;
pub mod features;
pub mod gbm;

pub use engine::{Confidence, ForecastingEngine, GraphPoint, PricePrediction};
