use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::time::Duration as StdDuration;
use tracing::debug;

use crate::platforms::traits::MarketDataProvider;
use crate::types::{Event, Market};

const BASE_URL: &str = "https://api.manifold.markets/v0";

/// Manifold charges no trading fee; CPMM slippage is not modeled here.
const FEE_RATE: f64 = 0.0;

/// Search API caps page size at 1000.
const MAX_LIMIT: usize = 1000;

pub struct ManifoldClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl ManifoldClient {
    /// The API key is optional; market data is readable without one.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| anyhow!("Failed to build Manifold HTTP client: {}", e))?;

        Ok(Self { http, api_key })
    }
}

#[async_trait]
impl MarketDataProvider for ManifoldClient {
    fn name(&self) -> &str {
        "Manifold"
    }

    fn fee_rate(&self) -> f64 {
        FEE_RATE
    }

    async fn get_events(&self, limit: usize, max_resolution_days: i64) -> Result<Vec<Event>> {
        let cutoff = Utc::now() + Duration::days(max_resolution_days);

        let mut request = self.http.get(format!("{}/search-markets", BASE_URL)).query(&[
            ("limit", limit.min(MAX_LIMIT).to_string()),
            ("sort", "close-date".to_string()),
            ("filter", "open".to_string()),
            ("contractType", "BINARY".to_string()),
            ("term", String::new()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Key {}", key));
        }

        let markets: Vec<Value> = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut normalized = Vec::new();

        // Each Manifold market stands alone as its own event
        for market in &markets {
            let close_ms = match market.get("closeTime").and_then(|v| v.as_i64()) {
                Some(ms) => ms,
                None => continue,
            };
            let end_date = match DateTime::from_timestamp_millis(close_ms) {
                Some(dt) => dt,
                None => continue,
            };
            if end_date > cutoff {
                continue;
            }
            if market.get("isResolved").and_then(|v| v.as_bool()) == Some(true) {
                continue;
            }

            let id = match market.get("id").and_then(|v| v.as_str()) {
                Some(id) => id.to_string(),
                None => continue,
            };
            let question = market
                .get("question")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            // The quoted probability is the approximate cost of a YES share
            let probability = market
                .get("probability")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.5);

            normalized.push(Event {
                id: id.clone(),
                title: question.clone(),
                end_date,
                platform: "manifold".to_string(),
                markets: vec![Market {
                    id,
                    question,
                    yes_price: Some(probability),
                    no_price: Some(1.0 - probability),
                }],
                raw: market.clone(),
            });
        }

        debug!("Normalized {} Manifold markets", normalized.len());
        Ok(normalized)
    }

    fn event_url(&self, event: &Event) -> Option<String> {
        let creator = event
            .raw
            .get("creatorUsername")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let slug = event
            .raw
            .get("slug")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        if !creator.is_empty() && !slug.is_empty() {
            Some(format!("https://manifold.markets/{}/{}", creator, slug))
        } else if !event.id.is_empty() {
            Some(format!("https://manifold.markets/{}", event.id))
        } else {
            None
        }
    }
}
