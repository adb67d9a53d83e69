//! Bounded tracker of processed event ids.

use std::collections::{HashSet, VecDeque};

use possync_entity::{Event, WorkerState};

/// Set of processed event ids with FIFO eviction.
///
/// Membership and insertion are O(1). Once `capacity` ids are held the
/// oldest inserted id is evicted, regardless of event timestamps.
#[derive(Debug, Clone)]
pub struct DedupTracker {
    /// Fast membership.
    seen: HashSet<String>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
    /// Maximum retained ids.
    capacity: usize,
}

impl DedupTracker {
    /// Create an empty tracker.
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a tracker from persisted state.
    pub fn from_state(state: &WorkerState, capacity: usize) -> Self {
        let mut tracker = Self::new(capacity);
        for id in &state.processed_event_ids {
            tracker.record(id);
        }
        tracker
    }

    /// Check whether an id was processed.
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Mark an id as processed. Returns `false` if it was already known.
    pub fn record(&mut self, id: &str) -> bool {
        if self.capacity == 0 || self.seen.contains(id) {
            return false;
        }

        self.seen.insert(id.to_string());
        self.order.push_back(id.to_string());

        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        true
    }

    /// Number of ids held.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no id is held.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Snapshot for persistence, oldest first.
    pub fn to_state(&self) -> WorkerState {
        WorkerState {
            processed_event_ids: self.order.iter().cloned().collect(),
        }
    }

    /// Select the most recent unprocessed events from a log.
    ///
    /// Walks `events` newest first, skipping processed ids, and stops after
    /// `window` hits or after looking back `capacity` entries. The result
    /// is returned oldest first. Ids repeated inside the scanned range are
    /// returned once.
    pub fn unprocessed(&self, events: Vec<Event>, window: usize) -> Vec<Event> {
        let mut picked: Vec<Event> = Vec::new();
        let mut picked_ids: HashSet<String> = HashSet::new();

        for event in events.into_iter().rev().take(self.capacity) {
            if picked.len() >= window {
                break;
            }
            if self.contains(&event.id) {
                continue;
            }
            // Keep the earliest occurrence of an id repeated in the window.
            if !picked_ids.insert(event.id.clone()) {
                if let Some(pos) = picked.iter().position(|e| e.id == event.id) {
                    picked.remove(pos);
                    picked.push(event);
                }
                continue;
            }
            picked.push(event);
        }

        picked.reverse();
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: &str) -> Event {
        Event::from_value(json!({"id": id, "type": "PRODUCT_UPDATED", "product_id": "p"}))
            .unwrap()
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut tracker = DedupTracker::new(10);
        assert!(tracker.record("e1"));
        assert!(!tracker.record("e1"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut tracker = DedupTracker::new(2000);
        for i in 0..2500 {
            tracker.record(&format!("e{i}"));
        }
        assert_eq!(tracker.len(), 2000);
        assert!(!tracker.contains("e0"));
        assert!(!tracker.contains("e499"));
        assert!(tracker.contains("e500"));
        assert!(tracker.contains("e2499"));

        let state = tracker.to_state();
        assert_eq!(state.processed_event_ids.len(), 2000);
        assert_eq!(state.processed_event_ids[0], "e500");
    }

    #[test]
    fn test_from_state_respects_capacity() {
        let state = WorkerState {
            processed_event_ids: vec!["a".into(), "b".into(), "c".into()],
        };
        let tracker = DedupTracker::from_state(&state, 2);
        assert!(!tracker.contains("a"));
        assert!(tracker.contains("b"));
        assert!(tracker.contains("c"));
    }

    #[test]
    fn test_unprocessed_window_is_chronological() {
        let mut tracker = DedupTracker::new(100);
        tracker.record("e2");
        let events = (1..=6).map(|i| event(&format!("e{i}"))).collect();

        let picked = tracker.unprocessed(events, 3);
        assert_eq!(ids(&picked), vec!["e4", "e5", "e6"]);
    }

    #[test]
    fn test_unprocessed_skips_processed() {
        let mut tracker = DedupTracker::new(100);
        tracker.record("e3");
        tracker.record("e4");
        let events = (1..=4).map(|i| event(&format!("e{i}"))).collect();

        assert_eq!(ids(&tracker.unprocessed(events, 10)), vec!["e1", "e2"]);
    }

    #[test]
    fn test_unprocessed_collapses_duplicate_ids() {
        let tracker = DedupTracker::new(100);
        let events = vec![event("e1"), event("e2"), event("e1")];
        assert_eq!(ids(&tracker.unprocessed(events, 10)), vec!["e1", "e2"]);
    }

    #[test]
    fn test_unprocessed_lookback_is_bounded_by_capacity() {
        let tracker = DedupTracker::new(3);
        let events = (1..=10).map(|i| event(&format!("e{i}"))).collect();
        assert_eq!(ids(&tracker.unprocessed(events, 10)), vec!["e8", "e9", "e10"]);
    }
}
