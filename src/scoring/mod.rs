//! Score Aggregator and Season Classifier: per-period pricing, holiday,
//! and weather scores, and the tercile split into Low/Normal/High.

pub mod aggregator;
pub mod classifier;
pub mod functions;

pub use aggregator::{PeriodScores, ScoreAggregator};
pub use classifier::{BestDeal, SeasonResult, classify};
