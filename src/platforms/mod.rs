pub mod manifold;
pub mod polymarket;
pub mod traits;

pub use manifold::ManifoldClient;
pub use polymarket::PolymarketClient;
pub use traits::*;

use anyhow::Result;

use crate::config::Config;

/// Build the two market-data providers in their (source A, source B) roles.
pub fn create_providers(
    config: &Config,
) -> Result<(Box<dyn MarketDataProvider>, Box<dyn MarketDataProvider>)> {
    let source_a = PolymarketClient::new(config.arbitrage.order_size_usd)?;
    let source_b = ManifoldClient::new(config.manifold.api_key.clone())?;
    Ok((Box::new(source_a), Box::new(source_b)))
}
