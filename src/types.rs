use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub question: String,
    pub yes_price: Option<f64>,
    pub no_price: Option<f64>,
}

/// A normalized prediction event from one platform. `raw` keeps the original
/// API payload so dispatch can derive deep links without re-fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub end_date: DateTime<Utc>,
    pub platform: String,
    pub markets: Vec<Market>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// Two events from different sources believed to represent the same
/// real-world outcome. Not one-to-one: several source events may pair with
/// the same target event.
#[derive(Debug, Clone)]
pub struct MatchedPair {
    pub source: Event,
    pub target: Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Buy YES on source A + NO on source B.
    YesANoB,
    /// Buy NO on source A + YES on source B.
    NoAYesB,
}

impl Direction {
    pub fn tag(&self) -> &'static str {
        match self {
            Direction::YesANoB => "yes_a_no_b",
            Direction::NoAYesB => "no_a_yes_b",
        }
    }

    pub fn describe(&self, name_a: &str, name_b: &str) -> String {
        match self {
            Direction::YesANoB => format!("Buy YES on {} + NO on {}", name_a, name_b),
            Direction::NoAYesB => format!("Buy NO on {} + YES on {}", name_a, name_b),
        }
    }
}

/// A fee-adjusted hedge across the first market of each event in a matched
/// pair. Pure function of its inputs; recomputed every scan cycle.
#[derive(Debug, Clone)]
pub struct Opportunity {
    pub event_a: Event,
    pub event_b: Event,
    pub market_a: Market,
    pub market_b: Market,
    pub direction: Direction,
    pub price_a: f64,
    pub price_b: f64,
    pub raw_cost: f64,
    pub fee_adjusted_cost: f64,
    pub payout: f64,
    pub profit: f64,
    pub profit_pct: f64,
}

impl Opportunity {
    pub fn new(
        pair: &MatchedPair,
        direction: Direction,
        price_a: f64,
        price_b: f64,
        fee_rate_a: f64,
        fee_rate_b: f64,
    ) -> Self {
        let raw_cost = price_a + price_b;
        let fee_adjusted_cost = price_a * (1.0 + fee_rate_a) + price_b * (1.0 + fee_rate_b);
        let payout = 1.0;
        let profit = payout - fee_adjusted_cost;
        let profit_pct = if fee_adjusted_cost > 0.0 {
            profit / fee_adjusted_cost * 100.0
        } else {
            0.0
        };

        Self {
            event_a: pair.source.clone(),
            event_b: pair.target.clone(),
            market_a: pair.source.markets[0].clone(),
            market_b: pair.target.markets[0].clone(),
            direction,
            price_a,
            price_b,
            raw_cost,
            fee_adjusted_cost,
            payout,
            profit,
            profit_pct,
        }
    }
}
