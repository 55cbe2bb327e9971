use anyhow::Result;
use async_trait::async_trait;

use crate::types::Event;

/// Capability interface for a prediction-market data source. Callers depend
/// only on this trait; no platform is special-cased downstream of it.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Proportional trading fee as a decimal (0.002 = 0.2%). Constant per
    /// provider instance.
    fn fee_rate(&self) -> f64;

    /// Fetch open events resolving within `max_resolution_days`, normalized
    /// to the canonical `Event` shape. Malformed upstream records are dropped
    /// individually rather than failing the fetch.
    async fn get_events(&self, limit: usize, max_resolution_days: i64) -> Result<Vec<Event>>;

    /// Deep link to the event on the provider's site, when derivable from
    /// the event's raw metadata.
    fn event_url(&self, event: &Event) -> Option<String>;
}
