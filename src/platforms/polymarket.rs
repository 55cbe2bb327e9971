use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

use crate::platforms::traits::MarketDataProvider;
use crate::types::{Event, Market};

const GAMMA_API: &str = "https://gamma-api.polymarket.com";
const CLOB_API: &str = "https://clob.polymarket.com";

/// Polymarket taker fee (0.2%).
const FEE_RATE: f64 = 0.002;

#[derive(Debug, Clone, Copy)]
struct BookLevel {
    price: f64,
    size: f64,
}

pub struct PolymarketClient {
    http: reqwest::Client,
    order_size_usd: f64,
}

impl PolymarketClient {
    pub fn new(order_size_usd: f64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| anyhow!("Failed to build Polymarket HTTP client: {}", e))?;

        Ok(Self {
            http,
            order_size_usd,
        })
    }

    /// Ask levels for a token, cheapest first. The CLOB API encodes prices
    /// and sizes as strings.
    async fn fetch_ask_levels(&self, token_id: &str) -> Result<Vec<BookLevel>> {
        let url = format!("{}/book?token_id={}", CLOB_API, token_id);
        let book: Value = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut levels = Vec::new();
        if let Some(asks) = book.get("asks").and_then(|v| v.as_array()) {
            for ask in asks {
                let price = ask
                    .get("price")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse::<f64>().ok());
                let size = ask
                    .get("size")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse::<f64>().ok());
                if let (Some(price), Some(size)) = (price, size) {
                    if price > 0.0 && size > 0.0 {
                        levels.push(BookLevel { price, size });
                    }
                }
            }
        }
        levels.sort_by(|a, b| a.price.total_cmp(&b.price));

        Ok(levels)
    }

    /// Depth-weighted buy price for `order_size_usd`, falling back to the
    /// best ask when the book is too thin. None when the book is empty or
    /// the fetch fails.
    async fn quote_buy_price(&self, token_id: &str) -> Option<f64> {
        let levels = match self.fetch_ask_levels(token_id).await {
            Ok(levels) => levels,
            Err(e) => {
                debug!("Book fetch failed for token {}: {}", token_id, e);
                return None;
            }
        };

        impact_price(&levels, self.order_size_usd)
    }
}

/// Sweep ask levels cheapest-first until `amount_usd` is filled and return
/// the volume-weighted average price paid. Thin books fall back to best ask.
fn impact_price(levels: &[BookLevel], amount_usd: f64) -> Option<f64> {
    let best_ask = levels.first()?.price;

    let mut filled_usd = 0.0;
    let mut shares = 0.0;
    for level in levels {
        let available = level.price * level.size;
        if filled_usd + available >= amount_usd {
            let remaining = amount_usd - filled_usd;
            shares += remaining / level.price;
            filled_usd = amount_usd;
            break;
        }
        shares += level.size;
        filled_usd += available;
    }

    if filled_usd >= amount_usd && shares > 0.0 {
        Some(amount_usd / shares)
    } else {
        Some(best_ask)
    }
}

/// Gamma encodes `clobTokenIds` either as a JSON array or as a JSON string
/// containing one. At least two entries (YES, NO) are required.
fn parse_clob_token_ids(raw: Option<&Value>) -> Option<(String, String)> {
    let value = raw?;
    let ids: Vec<String> = if let Some(array) = value.as_array() {
        array
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    } else if let Some(text) = value.as_str() {
        serde_json::from_str(text).ok()?
    } else {
        return None;
    };

    if ids.len() >= 2 {
        Some((ids[0].clone(), ids[1].clone()))
    } else {
        None
    }
}

/// Gamma ids arrive as either JSON strings or numbers.
fn json_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_tradeable(market: &Value) -> bool {
    market.get("enableOrderBook").and_then(|v| v.as_bool()) == Some(true)
        && market.get("closed").and_then(|v| v.as_bool()) != Some(true)
        && market.get("acceptingOrders").and_then(|v| v.as_bool()) != Some(false)
}

#[async_trait]
impl MarketDataProvider for PolymarketClient {
    fn name(&self) -> &str {
        "Polymarket"
    }

    fn fee_rate(&self) -> f64 {
        FEE_RATE
    }

    async fn get_events(&self, limit: usize, max_resolution_days: i64) -> Result<Vec<Event>> {
        let cutoff = Utc::now() + Duration::days(max_resolution_days);
        let url = format!("{}/events?closed=false&limit={}", GAMMA_API, limit);

        let events: Vec<Value> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut normalized = Vec::new();

        for event in &events {
            let end_str = match event.get("endDate").and_then(|v| v.as_str()) {
                Some(s) => s,
                None => continue,
            };
            let end_date = match DateTime::parse_from_rfc3339(end_str) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(_) => continue,
            };
            if end_date > cutoff {
                continue;
            }

            let markets = match event.get("markets").and_then(|v| v.as_array()) {
                Some(markets) if !markets.is_empty() => markets,
                _ => continue,
            };

            let mut normalized_markets = Vec::new();
            for market in markets.iter().filter(|m| is_tradeable(m)) {
                let (yes_token, no_token) =
                    match parse_clob_token_ids(market.get("clobTokenIds")) {
                        Some(tokens) => tokens,
                        None => continue,
                    };

                let yes_price = self.quote_buy_price(&yes_token).await;
                let mut no_price = self.quote_buy_price(&no_token).await;
                if no_price.is_none() {
                    // One-sided book: infer NO from the YES quote
                    no_price = yes_price.map(|yes| 1.0 - yes);
                }

                let yes_price = match yes_price {
                    Some(price) => price,
                    None => continue,
                };

                normalized_markets.push(Market {
                    id: json_id(market.get("id"))
                        .or_else(|| json_id(market.get("slug")))
                        .unwrap_or_default(),
                    question: market
                        .get("question")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    yes_price: Some(yes_price),
                    no_price,
                });
            }

            if normalized_markets.is_empty() {
                continue;
            }

            let id = match json_id(event.get("id")).or_else(|| json_id(event.get("slug"))) {
                Some(id) => id,
                None => {
                    warn!("Skipping Polymarket event with no id or slug");
                    continue;
                }
            };

            normalized.push(Event {
                id,
                title: event
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                end_date,
                platform: "polymarket".to_string(),
                markets: normalized_markets,
                raw: event.clone(),
            });
        }

        Ok(normalized)
    }

    fn event_url(&self, event: &Event) -> Option<String> {
        let slug = event.raw.get("slug").and_then(|v| v.as_str())?;
        if slug.is_empty() {
            return None;
        }
        Some(format!("https://polymarket.com/event/{}", slug))
    }
}
