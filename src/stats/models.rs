use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Event, MatchedPair, Opportunity};

/// Rolling history cap; the oldest records are evicted first.
pub const MAX_HISTORY: usize = 100;

/// Condensed view of one opportunity for the stats file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunitySummary {
    pub title: String,
    pub direction: String,
    pub profit_pct: f64,
    pub profit: f64,
    pub yes_a: f64,
    pub no_a: f64,
    pub yes_b: f64,
    pub no_b: f64,
}

impl OpportunitySummary {
    pub fn from_opportunity(opportunity: &Opportunity) -> Self {
        Self {
            title: truncate_chars(&opportunity.event_a.title, 60),
            direction: opportunity.direction.tag().to_string(),
            profit_pct: opportunity.profit_pct,
            profit: opportunity.profit,
            yes_a: opportunity.market_a.yes_price.unwrap_or(0.0),
            no_a: opportunity.market_a.no_price.unwrap_or(0.0),
            yes_b: opportunity.market_b.yes_price.unwrap_or(0.0),
            no_b: opportunity.market_b.no_price.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPreview {
    pub title: String,
    pub end_date: DateTime<Utc>,
    pub markets_count: usize,
}

impl EventPreview {
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: truncate_chars(&event.title, 60),
            end_date: event.end_date,
            markets_count: event.markets.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPreview {
    pub source_title: String,
    pub target_title: String,
    pub source_end_date: DateTime<Utc>,
    pub target_end_date: DateTime<Utc>,
}

impl MatchPreview {
    pub fn from_pair(pair: &MatchedPair) -> Self {
        Self {
            source_title: truncate_chars(&pair.source.title, 50),
            target_title: truncate_chars(&pair.target.title, 50),
            source_end_date: pair.source.end_date,
            target_end_date: pair.target.end_date,
        }
    }
}

/// One snapshot per scan cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub timestamp: DateTime<Utc>,
    pub source_a_events: usize,
    pub source_b_events: usize,
    pub matched: usize,
    pub opportunities_count: usize,
    pub alerts_sent: usize,
    pub opportunities: Vec<OpportunitySummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_a_sample: Option<Vec<EventPreview>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_b_sample: Option<Vec<EventPreview>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_details: Option<Vec<MatchPreview>>,
}

/// The single best opportunity seen over the store's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestOpportunity {
    pub title: String,
    pub profit_pct: f64,
    pub profit: f64,
    pub timestamp: DateTime<Utc>,
}

/// Durable stats consumed by the external dashboard. `total_*` counters are
/// cumulative since store creation and survive history truncation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsStore {
    pub scan_history: Vec<ScanRecord>,
    pub total_scans: u64,
    pub total_opportunities: u64,
    pub total_alerts: u64,
    pub best_opportunity: Option<BestOpportunity>,
    pub last_scan: Option<ScanRecord>,
}

/// Truncate to at most `max` characters (not bytes), keeping UTF-8 intact.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_string_unchanged() {
        assert_eq!(truncate_chars("hello", 60), "hello");
    }

    #[test]
    fn test_truncate_chars_limits_length() {
        let long = "x".repeat(100);
        assert_eq!(truncate_chars(&long, 60).chars().count(), 60);
    }

    #[test]
    fn test_truncate_chars_multibyte_safe() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
    }
}
