pub mod aggregator;
pub mod models;
pub mod persistence;

pub use aggregator::StatsAggregator;
pub use models::*;
pub use persistence::{JsonFileStore, StatsPersistence};
