use tracing::{debug, info};

use crate::types::{Direction, MatchedPair, Opportunity};

/// Scans matched pairs for fee-adjusted arbitrage. Both hedge directions of a
/// pair are evaluated independently; either, both, or neither may qualify.
pub struct OpportunityDetector {
    fee_rate_a: f64,
    fee_rate_b: f64,
    min_profit_pct: f64,
}

impl OpportunityDetector {
    pub fn new(fee_rate_a: f64, fee_rate_b: f64, min_profit_pct: f64) -> Self {
        Self {
            fee_rate_a,
            fee_rate_b,
            min_profit_pct,
        }
    }

    pub fn find_opportunities(&self, pairs: &[MatchedPair]) -> Vec<Opportunity> {
        let mut opportunities = Vec::new();

        for pair in pairs {
            // Only the first market of each event is compared; multi-market
            // events are not matched market-by-market.
            let market_a = match pair.source.markets.first() {
                Some(m) => m,
                None => continue,
            };
            let market_b = match pair.target.markets.first() {
                Some(m) => m,
                None => continue,
            };

            let (yes_a, no_a) = match (market_a.yes_price, market_a.no_price) {
                (Some(yes), Some(no)) => (yes, no),
                _ => continue,
            };
            let (yes_b, no_b) = match (market_b.yes_price, market_b.no_price) {
                (Some(yes), Some(no)) => (yes, no),
                _ => continue,
            };

            // Buy YES on A + NO on B: pays 1.0 whichever way it resolves
            let opportunity = Opportunity::new(
                pair,
                Direction::YesANoB,
                yes_a,
                no_b,
                self.fee_rate_a,
                self.fee_rate_b,
            );
            if opportunity.profit_pct >= self.min_profit_pct {
                opportunities.push(opportunity);
            } else {
                debug!(
                    "Below threshold ({:.2}% < {:.2}%): '{}' {}",
                    opportunity.profit_pct,
                    self.min_profit_pct,
                    pair.source.title,
                    opportunity.direction.tag()
                );
            }

            // Buy NO on A + YES on B
            let opportunity = Opportunity::new(
                pair,
                Direction::NoAYesB,
                no_a,
                yes_b,
                self.fee_rate_a,
                self.fee_rate_b,
            );
            if opportunity.profit_pct >= self.min_profit_pct {
                opportunities.push(opportunity);
            }
        }

        if !opportunities.is_empty() {
            info!("Found {} arbitrage opportunity(ies)", opportunities.len());
        }

        opportunities
    }
}
