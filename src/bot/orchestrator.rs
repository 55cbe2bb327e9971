use anyhow::{anyhow, Result};
use chrono::Utc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{
    alert::{AlertSink, TelegramNotifier},
    arbitrage::{match_events, OpportunityDetector},
    bot::cooldown::CooldownTracker,
    config::Config,
    platforms::{create_providers, MarketDataProvider},
    stats::{
        truncate_chars, EventPreview, JsonFileStore, MatchPreview, OpportunitySummary, ScanRecord,
        StatsAggregator,
    },
    types::{Event, MatchedPair, Opportunity},
};

/// The long-running scan loop: fetch both sources, match, detect, dispatch
/// deduplicated alerts, persist stats, sleep, repeat. A failed cycle is
/// logged and retried after a short recovery delay; nothing here exits the
/// process.
pub struct ScannerBot {
    config: Config,
    source_a: Box<dyn MarketDataProvider>,
    source_b: Box<dyn MarketDataProvider>,
    detector: OpportunityDetector,
    alerts: Box<dyn AlertSink>,
    stats: StatsAggregator,
    cooldowns: CooldownTracker,
    is_running: bool,
}

impl ScannerBot {
    pub fn new(config: Config) -> Result<Self> {
        let (source_a, source_b) = create_providers(&config)?;

        let detector = OpportunityDetector::new(
            source_a.fee_rate(),
            source_b.fee_rate(),
            config.arbitrage.min_profit_pct,
        );
        let alerts: Box<dyn AlertSink> = Box::new(TelegramNotifier::new(
            config.telegram.bot_token.clone(),
            config.telegram.chat_id.clone(),
        ));
        let stats = StatsAggregator::new(Box::new(JsonFileStore::new(&config.stats.path)));
        let cooldowns = CooldownTracker::new(config.arbitrage.alert_cooldown_seconds);

        Ok(Self {
            config,
            source_a,
            source_b,
            detector,
            alerts,
            stats,
            cooldowns,
            is_running: false,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.is_running {
            return Err(anyhow!("Scanner is already running"));
        }
        self.is_running = true;

        info!(
            "Cross-platform arbitrage scanner active: {} <-> {}",
            self.source_a.name(),
            self.source_b.name()
        );
        info!(
            "Min profit after fees: {}% | Alert cooldown: {} min",
            self.config.arbitrage.min_profit_pct,
            self.config.arbitrage.alert_cooldown_seconds / 60
        );
        info!(
            "Title similarity threshold: {} | Date tolerance: {} days | Horizon: {} days",
            self.config.matching.title_similarity_threshold,
            self.config.matching.date_tolerance_days,
            self.config.scan.resolution_horizon_days
        );

        let startup_message = format!(
            "Cross-Platform Arb Scanner Online\nMin profit: {}% (after fees) | Cooldown: {} min",
            self.config.arbitrage.min_profit_pct,
            self.config.arbitrage.alert_cooldown_seconds / 60
        );
        self.alerts.send(&startup_message).await;

        self.run_scan_loop().await
    }

    pub fn stop(&mut self) {
        info!("Stopping scanner");
        self.is_running = false;
    }

    async fn run_scan_loop(&mut self) -> Result<()> {
        let scan_delay = Duration::from_secs(self.config.scan.interval_seconds);
        let recovery_delay = Duration::from_secs(self.config.scan.recovery_seconds);
        let mut cycle_count = 0u64;

        while self.is_running {
            cycle_count += 1;
            debug!("Starting scan cycle #{}", cycle_count);

            match self.run_cycle().await {
                Ok(()) => {
                    sleep(scan_delay).await;
                }
                Err(e) => {
                    // A failed cycle is expected from time to time; recover
                    // on a shorter delay and keep going
                    if self.config.scan.debug {
                        error!("Scan cycle #{} failed: {:#}", cycle_count, e);
                    } else {
                        error!("Scan cycle #{} failed: {}", cycle_count, e);
                    }
                    sleep(recovery_delay).await;
                }
            }
        }

        info!("Scan loop stopped");
        Ok(())
    }

    async fn run_cycle(&mut self) -> Result<()> {
        let limit = self.config.scan.event_limit;
        let horizon = self.config.scan.resolution_horizon_days;

        // Both fetches are in flight before either result is awaited; a
        // failed source contributes zero events rather than aborting the
        // cycle
        let (result_a, result_b) = tokio::join!(
            self.source_a.get_events(limit, horizon),
            self.source_b.get_events(limit, horizon),
        );
        let events_a = result_a.unwrap_or_else(|e| {
            warn!("{} fetch failed: {}", self.source_a.name(), e);
            Vec::new()
        });
        let events_b = result_b.unwrap_or_else(|e| {
            warn!("{} fetch failed: {}", self.source_b.name(), e);
            Vec::new()
        });

        let pairs = match_events(
            &events_a,
            &events_b,
            self.config.matching.title_similarity_threshold,
            self.config.matching.date_tolerance_days,
        );
        let opportunities = self.detector.find_opportunities(&pairs);
        let alerts_sent = self.dispatch(&opportunities).await;

        self.cooldowns.evict_stale(Utc::now().timestamp());

        info!(
            "Scanned {} {} events, {} {} events, {} matched, {} opportunity(ies), {} alerted",
            events_a.len(),
            self.source_a.name(),
            events_b.len(),
            self.source_b.name(),
            pairs.len(),
            opportunities.len(),
            alerts_sent
        );

        let record = build_scan_record(&events_a, &events_b, &pairs, &opportunities, alerts_sent);
        if let Err(e) = self.stats.record(record) {
            warn!("Failed to record scan stats: {}", e);
        }

        Ok(())
    }

    /// Log every opportunity, then alert the ones whose cooldown has lapsed.
    /// Returns the number of alerts sent.
    async fn dispatch(&mut self, opportunities: &[Opportunity]) -> usize {
        let mut alerts_sent = 0;

        for opportunity in opportunities {
            let direction_text = opportunity
                .direction
                .describe(self.source_a.name(), self.source_b.name());

            info!(
                "{} | {} | cost+fees=${:.4} profit=${:.4} ({:.2}%)",
                truncate_chars(&opportunity.event_a.title, 50),
                direction_text,
                opportunity.fee_adjusted_cost,
                opportunity.profit,
                opportunity.profit_pct
            );

            let key = CooldownTracker::key_for(opportunity);
            let now = Utc::now().timestamp();
            if !self.cooldowns.should_alert(&key, now) {
                debug!(
                    "Cooldown active for {}/{} {}, suppressing alert",
                    key.0,
                    key.1,
                    opportunity.direction.tag()
                );
                continue;
            }
            self.cooldowns.mark_alerted(key, now);
            alerts_sent += 1;

            let message = format_alert(
                opportunity,
                &direction_text,
                self.source_a.name(),
                self.source_b.name(),
                self.source_a.event_url(&opportunity.event_a),
                self.source_b.event_url(&opportunity.event_b),
            );
            self.alerts.send(&message).await;
        }

        alerts_sent
    }
}

fn format_alert(
    opportunity: &Opportunity,
    direction_text: &str,
    name_a: &str,
    name_b: &str,
    link_a: Option<String>,
    link_b: Option<String>,
) -> String {
    let market_a = &opportunity.market_a;
    let market_b = &opportunity.market_b;

    let mut message = format!(
        "*CROSS-PLATFORM ARB*\n{}\n\n\
         Direction: `{}`\n\
         {} YES/NO: `${:.4}`/`${:.4}`\n\
         {} YES/NO: `${:.4}`/`${:.4}`\n\
         Cost=`${:.4}` Cost+fees=`${:.4}` Payout=`${:.1}`\n\
         Profit=`${:.4}` (`{:.2}%`)\n",
        opportunity.event_a.title,
        direction_text,
        name_a,
        market_a.yes_price.unwrap_or(0.0),
        market_a.no_price.unwrap_or(0.0),
        name_b,
        market_b.yes_price.unwrap_or(0.0),
        market_b.no_price.unwrap_or(0.0),
        opportunity.raw_cost,
        opportunity.fee_adjusted_cost,
        opportunity.payout,
        opportunity.profit,
        opportunity.profit_pct,
    );

    if let Some(link) = link_a {
        message.push_str(&format!("\n{}: {}", name_a, link));
    }
    if let Some(link) = link_b {
        message.push_str(&format!("\n{}: {}", name_b, link));
    }

    message
}

fn build_scan_record(
    events_a: &[Event],
    events_b: &[Event],
    pairs: &[MatchedPair],
    opportunities: &[Opportunity],
    alerts_sent: usize,
) -> ScanRecord {
    let sample = |events: &[Event]| -> Option<Vec<EventPreview>> {
        if events.is_empty() {
            None
        } else {
            Some(events.iter().take(5).map(EventPreview::from_event).collect())
        }
    };
    let matched_details = if pairs.is_empty() {
        None
    } else {
        Some(pairs.iter().take(10).map(MatchPreview::from_pair).collect())
    };

    ScanRecord {
        timestamp: Utc::now(),
        source_a_events: events_a.len(),
        source_b_events: events_b.len(),
        matched: pairs.len(),
        opportunities_count: opportunities.len(),
        alerts_sent,
        opportunities: opportunities
            .iter()
            .map(OpportunitySummary::from_opportunity)
            .collect(),
        source_a_sample: sample(events_a),
        source_b_sample: sample(events_b),
        matched_details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Market};
    use chrono::{TimeZone, Utc};

    fn create_test_event(id: &str, title: &str, platform: &str) -> Event {
        Event {
            id: id.to_string(),
            title: title.to_string(),
            end_date: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            platform: platform.to_string(),
            markets: vec![Market {
                id: format!("{}-m", id),
                question: title.to_string(),
                yes_price: Some(0.40),
                no_price: Some(0.60),
            }],
            raw: serde_json::Value::Null,
        }
    }

    fn create_test_opportunity() -> Opportunity {
        let pair = MatchedPair {
            source: create_test_event("a1", "Will it happen?", "source_a"),
            target: create_test_event("b1", "Will it happen", "source_b"),
        };
        Opportunity::new(&pair, Direction::YesANoB, 0.40, 0.45, 0.002, 0.0)
    }

    #[test]
    fn test_format_alert_includes_quotes_and_links() {
        let opportunity = create_test_opportunity();
        let message = format_alert(
            &opportunity,
            "Buy YES on Alpha + NO on Beta",
            "Alpha",
            "Beta",
            Some("https://alpha.example/e/1".to_string()),
            None,
        );

        assert!(message.contains("Will it happen?"));
        assert!(message.contains("Direction: `Buy YES on Alpha + NO on Beta`"));
        assert!(message.contains("Alpha YES/NO: `$0.4000`/`$0.6000`"));
        assert!(message.contains("Cost+fees=`$0.8508`"));
        assert!(message.contains("Payout=`$1.0`"));
        assert!(message.contains("Alpha: https://alpha.example/e/1"));
        assert!(!message.contains("Beta: http"));
    }

    #[test]
    fn test_build_scan_record_counts_and_samples() {
        let events_a: Vec<Event> = (0..8)
            .map(|i| create_test_event(&format!("a{}", i), "Event title", "source_a"))
            .collect();
        let events_b = vec![create_test_event("b0", "Event title", "source_b")];
        let pairs = vec![MatchedPair {
            source: events_a[0].clone(),
            target: events_b[0].clone(),
        }];
        let opportunities = vec![create_test_opportunity()];

        let record = build_scan_record(&events_a, &events_b, &pairs, &opportunities, 1);

        assert_eq!(record.source_a_events, 8);
        assert_eq!(record.source_b_events, 1);
        assert_eq!(record.matched, 1);
        assert_eq!(record.opportunities_count, 1);
        assert_eq!(record.alerts_sent, 1);
        // Samples are capped at the first five events
        assert_eq!(record.source_a_sample.as_ref().unwrap().len(), 5);
        assert_eq!(record.source_b_sample.as_ref().unwrap().len(), 1);
        assert_eq!(record.matched_details.as_ref().unwrap().len(), 1);
        assert_eq!(record.opportunities[0].direction, "yes_a_no_b");
    }

    #[test]
    fn test_build_scan_record_empty_cycle_omits_samples() {
        let record = build_scan_record(&[], &[], &[], &[], 0);

        assert_eq!(record.opportunities_count, 0);
        assert!(record.source_a_sample.is_none());
        assert!(record.source_b_sample.is_none());
        assert!(record.matched_details.is_none());
    }
}
