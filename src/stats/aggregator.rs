use anyhow::Result;
use tracing::debug;

use crate::stats::models::{BestOpportunity, ScanRecord, StatsStore, MAX_HISTORY};
use crate::stats::persistence::StatsPersistence;

/// Maintains the bounded scan history and running aggregates behind the
/// persistence port. Read-modify-write per cycle; single writer assumed.
pub struct StatsAggregator {
    persistence: Box<dyn StatsPersistence>,
}

impl StatsAggregator {
    pub fn new(persistence: Box<dyn StatsPersistence>) -> Self {
        Self { persistence }
    }

    pub fn record(&self, scan: ScanRecord) -> Result<()> {
        let mut store = self.persistence.load().unwrap_or_default();

        store.total_scans += 1;
        store.total_opportunities += scan.opportunities_count as u64;
        store.total_alerts += scan.alerts_sent as u64;

        // Best-ever only moves on a strictly better profit percentage
        let cycle_best = scan
            .opportunities
            .iter()
            .max_by(|a, b| a.profit_pct.total_cmp(&b.profit_pct));
        if let Some(best) = cycle_best {
            let improves = store
                .best_opportunity
                .as_ref()
                .map_or(true, |current| best.profit_pct > current.profit_pct);
            if improves {
                store.best_opportunity = Some(BestOpportunity {
                    title: best.title.clone(),
                    profit_pct: best.profit_pct,
                    profit: best.profit,
                    timestamp: scan.timestamp,
                });
            }
        }

        store.scan_history.push(scan.clone());
        if store.scan_history.len() > MAX_HISTORY {
            let excess = store.scan_history.len() - MAX_HISTORY;
            store.scan_history.drain(..excess);
        }
        store.last_scan = Some(scan);

        debug!(
            "Recorded scan #{} ({} in history)",
            store.total_scans,
            store.scan_history.len()
        );
        self.persistence.save(&store)
    }

    pub fn read(&self) -> Option<StatsStore> {
        self.persistence.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::models::OpportunitySummary;
    use crate::stats::persistence::JsonFileStore;
    use chrono::{Duration, TimeZone, Utc};

    fn create_aggregator(dir: &tempfile::TempDir) -> StatsAggregator {
        StatsAggregator::new(Box::new(JsonFileStore::new(dir.path().join("stats.json"))))
    }

    fn create_test_record(scan_index: i64, opportunities: Vec<OpportunitySummary>) -> ScanRecord {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        ScanRecord {
            timestamp: base + Duration::minutes(scan_index),
            source_a_events: 10,
            source_b_events: 20,
            matched: 2,
            opportunities_count: opportunities.len(),
            alerts_sent: 1,
            opportunities,
            source_a_sample: None,
            source_b_sample: None,
            matched_details: None,
        }
    }

    fn create_test_summary(title: &str, profit_pct: f64) -> OpportunitySummary {
        OpportunitySummary {
            title: title.to_string(),
            direction: "yes_a_no_b".to_string(),
            profit_pct,
            profit: profit_pct / 100.0,
            yes_a: 0.4,
            no_a: 0.6,
            yes_b: 0.55,
            no_b: 0.45,
        }
    }

    #[test]
    fn test_record_initializes_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = create_aggregator(&dir);

        aggregator.record(create_test_record(0, Vec::new())).unwrap();

        let store = aggregator.read().unwrap();
        assert_eq!(store.total_scans, 1);
        assert_eq!(store.scan_history.len(), 1);
        assert!(store.last_scan.is_some());
        assert!(store.best_opportunity.is_none());
    }

    #[test]
    fn test_history_capped_but_totals_cumulative() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = create_aggregator(&dir);

        for i in 0..150 {
            aggregator.record(create_test_record(i, Vec::new())).unwrap();
        }

        let store = aggregator.read().unwrap();
        assert_eq!(store.scan_history.len(), MAX_HISTORY);
        assert_eq!(store.total_scans, 150);
        // Oldest evicted first: the earliest surviving record is scan #50
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            store.scan_history[0].timestamp,
            base + Duration::minutes(50)
        );
    }

    #[test]
    fn test_best_opportunity_requires_strict_improvement() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = create_aggregator(&dir);

        aggregator
            .record(create_test_record(0, vec![create_test_summary("first", 5.0)]))
            .unwrap();
        // Equal profit must not displace the original
        aggregator
            .record(create_test_record(1, vec![create_test_summary("second", 5.0)]))
            .unwrap();

        let store = aggregator.read().unwrap();
        assert_eq!(store.best_opportunity.as_ref().unwrap().title, "first");

        aggregator
            .record(create_test_record(2, vec![create_test_summary("third", 5.1)]))
            .unwrap();
        let store = aggregator.read().unwrap();
        assert_eq!(store.best_opportunity.as_ref().unwrap().title, "third");
    }

    #[test]
    fn test_best_opportunity_picks_cycle_maximum() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = create_aggregator(&dir);

        aggregator
            .record(create_test_record(
                0,
                vec![
                    create_test_summary("small", 2.0),
                    create_test_summary("large", 9.0),
                    create_test_summary("medium", 4.0),
                ],
            ))
            .unwrap();

        let store = aggregator.read().unwrap();
        assert_eq!(store.best_opportunity.as_ref().unwrap().title, "large");
    }

    #[test]
    fn test_totals_accumulate_opportunities_and_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = create_aggregator(&dir);

        aggregator
            .record(create_test_record(0, vec![create_test_summary("a", 1.0)]))
            .unwrap();
        aggregator
            .record(create_test_record(
                1,
                vec![create_test_summary("b", 1.0), create_test_summary("c", 2.0)],
            ))
            .unwrap();

        let store = aggregator.read().unwrap();
        assert_eq!(store.total_opportunities, 3);
        assert_eq!(store.total_alerts, 2);
    }

    #[test]
    fn test_round_trip_preserves_history_tail() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = create_aggregator(&dir);

        let record = create_test_record(0, vec![create_test_summary("kept", 3.0)]);
        aggregator.record(record.clone()).unwrap();

        let store = aggregator.read().unwrap();
        let tail = store.scan_history.last().unwrap();
        assert_eq!(tail.timestamp, record.timestamp);
        assert_eq!(tail.opportunities.len(), 1);
        assert_eq!(tail.opportunities[0].title, "kept");
        assert_eq!(tail.opportunities[0].profit_pct, 3.0);
    }

    #[test]
    fn test_read_without_store_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = create_aggregator(&dir);
        assert!(aggregator.read().is_none());
    }
}
