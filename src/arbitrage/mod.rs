pub mod detector;
pub mod matcher;

pub use detector::OpportunityDetector;
pub use matcher::{match_events, title_similarity};
