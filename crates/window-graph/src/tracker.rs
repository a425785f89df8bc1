//! Per-event orchestration.
//!
//! For each parsed event the tracker classifies it against the window,
//! applies its tag pairs to the backend, evicts expired edges and reports
//! the metric. A stale event leaves everything untouched but still gets a
//! metric, so every parsed record yields exactly one output line.

use crate::aggregate::AverageDegree;
use crate::backend::{EdgeBackend, Upsert};
use crate::error::{InvariantViolation, WindowError};
use crate::event::{Event, Timestamp};
use crate::store::OrderedEdgeStore;
use crate::window::WindowPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No event accepted yet.
    Idle,
    Active,
}

/// What one event did to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted {
        inserted: usize,
        refreshed: usize,
        evicted: usize,
    },
    /// Older than the window; nothing changed.
    Rejected,
}

pub struct DegreeTracker<B = OrderedEdgeStore> {
    window: WindowPolicy,
    backend: B,
    accepted: u64,
    rejected: u64,
}

impl DegreeTracker<OrderedEdgeStore> {
    /// Ordered store with backward-scan insertion.
    pub fn new(window_secs: u32) -> Result<Self, WindowError> {
        Ok(Self::with_backend(
            WindowPolicy::new(window_secs)?,
            OrderedEdgeStore::new(),
        ))
    }
}

impl<B: EdgeBackend> DegreeTracker<B> {
    pub fn with_backend(window: WindowPolicy, backend: B) -> Self {
        Self {
            window,
            backend,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Apply one event without formatting anything.
    pub fn apply(&mut self, event: &Event) -> Outcome {
        if !self.window.is_in_window(event.timestamp) {
            self.rejected += 1;
            tracing::debug!(
                timestamp = event.timestamp,
                latest = ?self.window.latest(),
                "rejected event older than window"
            );
            return Outcome::Rejected;
        }

        self.window.advance(event.timestamp);
        self.accepted += 1;

        let (mut inserted, mut refreshed) = (0, 0);
        if event.tags.len() >= 2 {
            for pair in event.pairs() {
                match self.backend.upsert(pair, event.timestamp) {
                    Upsert::Inserted => inserted += 1,
                    Upsert::Refreshed => refreshed += 1,
                    Upsert::Unchanged => {}
                }
            }
        }

        let evicted = match self.window.threshold() {
            Some(threshold) => self.backend.evict_before(threshold),
            None => 0,
        };

        Outcome::Accepted {
            inserted,
            refreshed,
            evicted,
        }
    }

    /// Apply one event and return the metric afterwards.
    pub fn process(&mut self, event: &Event) -> AverageDegree {
        self.apply(event);
        self.average_degree()
    }

    /// Lazily turn parsed records into metric lines. `None` marks a record
    /// that failed to parse; it is skipped and produces no line.
    pub fn metrics<'a, I>(&'a mut self, records: I) -> impl Iterator<Item = String> + 'a
    where
        I: IntoIterator<Item = Option<Event>>,
        I::IntoIter: 'a,
    {
        records
            .into_iter()
            .flatten()
            .map(move |event| self.process(&event).to_string())
    }

    pub fn average_degree(&self) -> AverageDegree {
        self.backend.average_degree()
    }

    pub fn state(&self) -> TrackerState {
        if self.accepted == 0 {
            TrackerState::Idle
        } else {
            TrackerState::Active
        }
    }

    pub fn latest(&self) -> Option<Timestamp> {
        self.window.latest()
    }

    pub fn window(&self) -> &WindowPolicy {
        &self.window
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Backend consistency plus the no-stale-survivor rule for the current
    /// window.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.backend.check_invariants(self.window.threshold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rescan::RescanGraph;

    #[test]
    fn starts_idle() {
        let tracker = DegreeTracker::new(60).unwrap();
        assert_eq!(tracker.state(), TrackerState::Idle);
        assert_eq!(tracker.average_degree().to_string(), "0.00");
    }

    #[test]
    fn single_tag_event_still_activates() {
        let mut tracker = DegreeTracker::new(60).unwrap();
        let outcome = tracker.apply(&Event::new(100, ["lonely"]));
        assert_eq!(
            outcome,
            Outcome::Accepted {
                inserted: 0,
                refreshed: 0,
                evicted: 0
            }
        );
        assert_eq!(tracker.state(), TrackerState::Active);
        assert_eq!(tracker.latest(), Some(100));
    }

    #[test]
    fn stale_event_does_not_move_high_water_mark() {
        let mut tracker = DegreeTracker::new(60).unwrap();
        tracker.apply(&Event::new(1000, ["a", "b"]));
        assert_eq!(tracker.apply(&Event::new(900, ["c", "d"])), Outcome::Rejected);
        assert_eq!(tracker.latest(), Some(1000));
        assert_eq!(tracker.rejected(), 1);
        assert_eq!(tracker.backend().edge_count(), 1);
    }

    #[test]
    fn out_of_order_event_inside_window_is_kept() {
        let mut tracker = DegreeTracker::new(60).unwrap();
        tracker.apply(&Event::new(1000, ["a", "b"]));
        tracker.apply(&Event::new(970, ["c", "d"]));
        assert_eq!(tracker.latest(), Some(1000));
        assert_eq!(tracker.backend().edge_count(), 2);
        assert!(tracker.check_invariants().is_ok());
    }

    #[test]
    fn metrics_skip_unparsed_records() {
        let mut tracker = DegreeTracker::new(60).unwrap();
        let records = vec![
            Some(Event::new(10, ["a", "b"])),
            None,
            Some(Event::new(11, ["a", "c"])),
        ];
        let lines: Vec<String> = tracker.metrics(records).collect();
        assert_eq!(lines, vec!["1.00", "1.33"]);
    }

    #[test]
    fn works_over_rescan_backend() {
        let mut tracker =
            DegreeTracker::with_backend(WindowPolicy::default(), RescanGraph::new());
        assert_eq!(tracker.process(&Event::new(5, ["a", "b", "c"])).to_string(), "2.00");
        assert_eq!(tracker.process(&Event::new(70, ["d", "e"])).to_string(), "1.00");
    }
}
