use std::collections::HashMap;

use crate::types::{Direction, Opportunity};

pub type CooldownKey = (String, String, Direction);

/// Keys older than this multiple of the window are dropped during the
/// per-cycle eviction pass; anything past one window would re-alert anyway.
const EVICTION_MULTIPLE: i64 = 4;

/// Alert deduplication state, owned by the orchestrator and threaded through
/// its loop iterations. Keyed by the two event ids plus hedge direction.
pub struct CooldownTracker {
    window_seconds: i64,
    last_alerted: HashMap<CooldownKey, i64>,
}

impl CooldownTracker {
    pub fn new(window_seconds: u64) -> Self {
        Self {
            window_seconds: window_seconds as i64,
            last_alerted: HashMap::new(),
        }
    }

    pub fn key_for(opportunity: &Opportunity) -> CooldownKey {
        (
            opportunity.event_a.id.clone(),
            opportunity.event_b.id.clone(),
            opportunity.direction,
        )
    }

    /// True when the key has never alerted or its window has fully elapsed.
    pub fn should_alert(&self, key: &CooldownKey, now: i64) -> bool {
        match self.last_alerted.get(key) {
            Some(&last) => now - last >= self.window_seconds,
            None => true,
        }
    }

    pub fn mark_alerted(&mut self, key: CooldownKey, now: i64) {
        self.last_alerted.insert(key, now);
    }

    /// Drop entries old enough that they no longer affect suppression.
    pub fn evict_stale(&mut self, now: i64) {
        let horizon = self.window_seconds * EVICTION_MULTIPLE;
        self.last_alerted.retain(|_, &mut last| now - last < horizon);
    }

    pub fn len(&self) -> usize {
        self.last_alerted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_alerted.is_empty()
    }
}
