//! The contract shared by every edge storage strategy.

use crate::aggregate::AverageDegree;
use crate::error::{InvariantViolation, UnknownKind};
use crate::event::Timestamp;
use crate::pair::CanonicalPair;
use crate::rescan::RescanGraph;
use crate::store::{OrderedEdgeStore, SearchKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What an upsert did to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// New edge; both endpoint degrees went up by one.
    Inserted,
    /// Existing edge moved to a newer last-seen time.
    Refreshed,
    /// Existing edge already at an equal or newer time.
    Unchanged,
}

/// Windowed edge storage with an attached degree table.
///
/// Implementations must keep degrees and edges consistent after every call:
/// the sum of all vertex degrees is always twice the edge count.
pub trait EdgeBackend {
    /// Insert `pair`, or raise its last-seen time to `timestamp` if newer.
    fn upsert(&mut self, pair: CanonicalPair, timestamp: Timestamp) -> Upsert;

    /// Drop every edge last seen strictly before `threshold`. Returns how
    /// many edges were removed.
    fn evict_before(&mut self, threshold: Timestamp) -> usize;

    fn edge_count(&self) -> usize;

    fn vertex_count(&self) -> usize;

    fn degree(&self, vertex: &str) -> usize;

    fn last_seen(&self, pair: &CanonicalPair) -> Option<Timestamp>;

    /// Full consistency check. With a threshold, also checks that no
    /// expired edge is still live.
    fn check_invariants(&self, threshold: Option<Timestamp>) -> Result<(), InvariantViolation>;

    fn average_degree(&self) -> AverageDegree {
        AverageDegree::new(self.edge_count(), self.vertex_count())
    }
}

impl<B: EdgeBackend + ?Sized> EdgeBackend for Box<B> {
    fn upsert(&mut self, pair: CanonicalPair, timestamp: Timestamp) -> Upsert {
        (**self).upsert(pair, timestamp)
    }

    fn evict_before(&mut self, threshold: Timestamp) -> usize {
        (**self).evict_before(threshold)
    }

    fn edge_count(&self) -> usize {
        (**self).edge_count()
    }

    fn vertex_count(&self) -> usize {
        (**self).vertex_count()
    }

    fn degree(&self, vertex: &str) -> usize {
        (**self).degree(vertex)
    }

    fn last_seen(&self, pair: &CanonicalPair) -> Option<Timestamp> {
        (**self).last_seen(pair)
    }

    fn check_invariants(&self, threshold: Option<Timestamp>) -> Result<(), InvariantViolation> {
        (**self).check_invariants(threshold)
    }
}

/// Which backend to run, as named in config files and on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Sorted edge sequence with incremental degrees.
    #[default]
    Ordered,
    /// Adjacency map rescanned on every event.
    Rescan,
}

impl BackendKind {
    /// `search` only applies to the ordered backend.
    pub fn build(self, search: SearchKind) -> Box<dyn EdgeBackend> {
        match self {
            BackendKind::Ordered => Box::new(OrderedEdgeStore::with_search(search.strategy())),
            BackendKind::Rescan => Box::new(RescanGraph::new()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ordered => "ordered",
            BackendKind::Rescan => "rescan",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ordered" => Ok(BackendKind::Ordered),
            "rescan" => Ok(BackendKind::Rescan),
            _ => Err(UnknownKind {
                what: "backend",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> CanonicalPair {
        CanonicalPair::new(a, b).unwrap()
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Ordered".parse::<BackendKind>(), Ok(BackendKind::Ordered));
        assert_eq!("rescan".parse::<BackendKind>(), Ok(BackendKind::Rescan));
        assert!("btree".parse::<BackendKind>().is_err());
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&BackendKind::Rescan).unwrap();
        assert_eq!(json, "\"rescan\"");
    }

    #[test]
    fn boxed_backends_behave_alike() {
        for kind in [BackendKind::Ordered, BackendKind::Rescan] {
            let mut backend = kind.build(SearchKind::Backward);
            assert_eq!(backend.upsert(pair("a", "b"), 10), Upsert::Inserted);
            assert_eq!(backend.upsert(pair("b", "a"), 5), Upsert::Unchanged);
            assert_eq!(backend.upsert(pair("a", "b"), 12), Upsert::Refreshed);
            assert_eq!(backend.last_seen(&pair("a", "b")), Some(12));
            assert_eq!(backend.average_degree().to_string(), "1.00");
            assert_eq!(backend.evict_before(13), 1);
            assert_eq!(backend.vertex_count(), 0);
            assert!(backend.check_invariants(Some(13)).is_ok(), "{kind}");
        }
    }
}
