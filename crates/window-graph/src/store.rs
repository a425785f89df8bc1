//! Ordered edge store.
//!
//! Edges live in a deque sorted by last-seen time, oldest at the front.
//! A side index maps each pair to its last-seen time so repeats are found
//! without a scan, and the degree table is updated in the same call that
//! inserts or evicts an edge.
//!
//! Eviction pops from the front until it meets a live edge, so its cost is
//! bounded by the number of expired edges. Insertion asks an
//! [`InsertionSearch`] for the position; the default [`BackwardScan`] walks
//! from the newest end, which is O(1) for in-order streams and O(n) when
//! the input is heavily reordered.

use crate::backend::{EdgeBackend, Upsert};
use crate::degree::DegreeTable;
use crate::error::{InvariantViolation, UnknownKind};
use crate::event::Timestamp;
use crate::pair::CanonicalPair;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

/// A live co-occurrence edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub pair: CanonicalPair,
    pub last_seen: Timestamp,
}

/// Finds where an edge last seen at `timestamp` belongs in a sorted deque.
///
/// Every implementation must return the position just after the last edge
/// whose `last_seen` is less than or equal to `timestamp`, so strategies
/// can be swapped without changing the order of equal-time edges.
pub trait InsertionSearch {
    fn insertion_index(&self, edges: &VecDeque<Edge>, timestamp: Timestamp) -> usize;
}

impl<S: InsertionSearch + ?Sized> InsertionSearch for Box<S> {
    fn insertion_index(&self, edges: &VecDeque<Edge>, timestamp: Timestamp) -> usize {
        (**self).insertion_index(edges, timestamp)
    }
}

/// Linear walk from the newest end.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackwardScan;

impl InsertionSearch for BackwardScan {
    fn insertion_index(&self, edges: &VecDeque<Edge>, timestamp: Timestamp) -> usize {
        let mut index = edges.len();
        while index > 0 && edges[index - 1].last_seen > timestamp {
            index -= 1;
        }
        index
    }
}

/// Binary search over the whole deque.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinarySearch;

impl InsertionSearch for BinarySearch {
    fn insertion_index(&self, edges: &VecDeque<Edge>, timestamp: Timestamp) -> usize {
        edges.partition_point(|edge| edge.last_seen <= timestamp)
    }
}

/// Insertion strategy selectable at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    #[default]
    Backward,
    Binary,
}

impl SearchKind {
    pub fn strategy(self) -> Box<dyn InsertionSearch> {
        match self {
            SearchKind::Backward => Box::new(BackwardScan),
            SearchKind::Binary => Box::new(BinarySearch),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Backward => "backward",
            SearchKind::Binary => "binary",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "backward" => Ok(SearchKind::Backward),
            "binary" => Ok(SearchKind::Binary),
            _ => Err(UnknownKind {
                what: "search strategy",
                value: s.to_string(),
            }),
        }
    }
}

/// Edges sorted by last-seen time plus the degree table they induce.
pub struct OrderedEdgeStore<S = BackwardScan> {
    edges: VecDeque<Edge>,
    index: HashMap<CanonicalPair, Timestamp>,
    degrees: DegreeTable,
    search: S,
}

impl OrderedEdgeStore<BackwardScan> {
    pub fn new() -> Self {
        Self::with_search(BackwardScan)
    }
}

impl Default for OrderedEdgeStore<BackwardScan> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: InsertionSearch> OrderedEdgeStore<S> {
    pub fn with_search(search: S) -> Self {
        Self {
            edges: VecDeque::new(),
            index: HashMap::new(),
            degrees: DegreeTable::new(),
            search,
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edges from oldest to newest.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn degrees(&self) -> &DegreeTable {
        &self.degrees
    }

    /// Oldest live last-seen time.
    pub fn oldest(&self) -> Option<Timestamp> {
        self.edges.front().map(|edge| edge.last_seen)
    }

    pub fn newest(&self) -> Option<Timestamp> {
        self.edges.back().map(|edge| edge.last_seen)
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.index.clear();
        self.degrees.clear();
    }

    /// Position of `pair` given its indexed last-seen time. Jumps to the
    /// first edge with that time, then walks the run of equal times.
    fn position(&self, pair: &CanonicalPair, last_seen: Timestamp) -> Option<usize> {
        let start = self.edges.partition_point(|edge| edge.last_seen < last_seen);
        self.edges
            .range(start..)
            .take_while(|edge| edge.last_seen == last_seen)
            .position(|edge| edge.pair == *pair)
            .map(|offset| start + offset)
    }

    fn insert_new(&mut self, pair: CanonicalPair, timestamp: Timestamp) {
        let (low, high) = pair.endpoints();
        self.degrees.increment(low);
        self.degrees.increment(high);
        self.index.insert(pair.clone(), timestamp);

        let at = self.search.insertion_index(&self.edges, timestamp);
        self.edges.insert(
            at,
            Edge {
                pair,
                last_seen: timestamp,
            },
        );
    }

    fn refresh(&mut self, pair: CanonicalPair, previous: Timestamp, timestamp: Timestamp) {
        let Some(mut edge) = self
            .position(&pair, previous)
            .and_then(|position| self.edges.remove(position))
        else {
            tracing::error!(%pair, previous, "indexed edge missing from sequence");
            return;
        };

        edge.last_seen = timestamp;
        let at = self.search.insertion_index(&self.edges, timestamp);
        self.edges.insert(at, edge);
        self.index.insert(pair, timestamp);
    }
}

impl<S: InsertionSearch> EdgeBackend for OrderedEdgeStore<S> {
    fn upsert(&mut self, pair: CanonicalPair, timestamp: Timestamp) -> Upsert {
        match self.index.get(&pair).copied() {
            Some(previous) if timestamp <= previous => Upsert::Unchanged,
            Some(previous) => {
                self.refresh(pair, previous, timestamp);
                Upsert::Refreshed
            }
            None => {
                self.insert_new(pair, timestamp);
                Upsert::Inserted
            }
        }
    }

    fn evict_before(&mut self, threshold: Timestamp) -> usize {
        let mut evicted = 0;
        while self
            .edges
            .front()
            .is_some_and(|edge| edge.last_seen < threshold)
        {
            let Some(edge) = self.edges.pop_front() else {
                break;
            };
            self.index.remove(&edge.pair);
            let (low, high) = edge.pair.endpoints();
            self.degrees.decrement(low);
            self.degrees.decrement(high);
            evicted += 1;
        }

        if evicted > 0 {
            tracing::debug!(
                evicted,
                threshold,
                remaining = self.edges.len(),
                "evicted expired edges"
            );
        }
        evicted
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn vertex_count(&self) -> usize {
        self.degrees.vertex_count()
    }

    fn degree(&self, vertex: &str) -> usize {
        self.degrees.degree(vertex)
    }

    fn last_seen(&self, pair: &CanonicalPair) -> Option<Timestamp> {
        self.index.get(pair).copied()
    }

    fn check_invariants(&self, threshold: Option<Timestamp>) -> Result<(), InvariantViolation> {
        if self.index.len() != self.edges.len() {
            return Err(InvariantViolation::IndexOutOfSync {
                index: self.index.len(),
                sequence: self.edges.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.edges.len());
        for (position, edge) in self.edges.iter().enumerate() {
            if position > 0 && self.edges[position - 1].last_seen > edge.last_seen {
                return Err(InvariantViolation::Unsorted { position });
            }
            if !seen.insert(&edge.pair) {
                return Err(InvariantViolation::DuplicateEdge {
                    pair: edge.pair.to_string(),
                });
            }
            if self.index.get(&edge.pair) != Some(&edge.last_seen) {
                return Err(InvariantViolation::IndexOutOfSync {
                    index: self.index.len(),
                    sequence: self.edges.len(),
                });
            }
            if let Some(threshold) = threshold {
                if edge.last_seen < threshold {
                    return Err(InvariantViolation::StaleEdge {
                        pair: edge.pair.to_string(),
                        last_seen: edge.last_seen,
                        threshold,
                    });
                }
            }
        }

        self.degrees.check()?;
        if self.degrees.degree_sum() != 2 * self.edges.len() {
            return Err(InvariantViolation::DegreeSum {
                degree_sum: self.degrees.degree_sum(),
                edges: self.edges.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> CanonicalPair {
        CanonicalPair::new(a, b).unwrap()
    }

    fn timeline<S: InsertionSearch>(store: &OrderedEdgeStore<S>) -> Vec<(String, Timestamp)> {
        store
            .edges()
            .map(|edge| (edge.pair.to_string(), edge.last_seen))
            .collect()
    }

    fn deque(times: &[Timestamp]) -> VecDeque<Edge> {
        times
            .iter()
            .enumerate()
            .map(|(i, &t)| Edge {
                pair: pair("a", &format!("v{i}")),
                last_seen: t,
            })
            .collect()
    }

    #[test]
    fn strategies_agree_on_ties() {
        let edges = deque(&[1, 3, 3, 3, 7, 9]);
        for t in [0, 1, 2, 3, 4, 7, 8, 9, 10] {
            assert_eq!(
                BackwardScan.insertion_index(&edges, t),
                BinarySearch.insertion_index(&edges, t),
                "timestamp {t}"
            );
        }
        assert_eq!(BackwardScan.insertion_index(&edges, 3), 4);
        assert_eq!(BackwardScan.insertion_index(&VecDeque::new(), 3), 0);
    }

    #[test]
    fn out_of_order_insert_lands_sorted() {
        let mut store = OrderedEdgeStore::new();
        store.upsert(pair("a", "b"), 10);
        store.upsert(pair("c", "d"), 30);
        store.upsert(pair("e", "f"), 20);
        store.upsert(pair("g", "h"), 5);
        assert_eq!(
            timeline(&store),
            vec![
                ("g|h".to_string(), 5),
                ("a|b".to_string(), 10),
                ("e|f".to_string(), 20),
                ("c|d".to_string(), 30),
            ]
        );
        assert!(store.check_invariants(None).is_ok());
    }

    #[test]
    fn refresh_moves_edge_to_new_position() {
        let mut store = OrderedEdgeStore::with_search(BinarySearch);
        store.upsert(pair("a", "b"), 10);
        store.upsert(pair("c", "d"), 20);
        assert_eq!(store.upsert(pair("b", "a"), 25), Upsert::Refreshed);
        assert_eq!(store.oldest(), Some(20));
        assert_eq!(store.newest(), Some(25));
        assert_eq!(store.len(), 2);
        assert_eq!(store.degree("a"), 1);
        assert!(store.check_invariants(None).is_ok());
    }

    #[test]
    fn refresh_finds_edge_among_equal_times() {
        let mut store = OrderedEdgeStore::new();
        for other in ["b", "c", "d", "e"] {
            store.upsert(pair("a", other), 10);
        }
        assert_eq!(store.upsert(pair("a", "d"), 11), Upsert::Refreshed);
        let last = store.edges().last().unwrap();
        assert_eq!(last.pair, pair("a", "d"));
        assert!(store.check_invariants(None).is_ok());
    }

    #[test]
    fn older_or_equal_repeat_is_unchanged() {
        let mut store = OrderedEdgeStore::new();
        store.upsert(pair("a", "b"), 10);
        assert_eq!(store.upsert(pair("a", "b"), 10), Upsert::Unchanged);
        assert_eq!(store.upsert(pair("a", "b"), 3), Upsert::Unchanged);
        assert_eq!(store.last_seen(&pair("a", "b")), Some(10));
        assert_eq!(store.degrees().degree_sum(), 2);
    }

    #[test]
    fn eviction_is_a_prefix_scan() {
        let mut store = OrderedEdgeStore::new();
        store.upsert(pair("a", "b"), 1);
        store.upsert(pair("a", "c"), 2);
        store.upsert(pair("b", "c"), 3);
        store.upsert(pair("c", "d"), 4);

        assert_eq!(store.evict_before(3), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.degree("a"), 0);
        assert_eq!(store.degree("c"), 2);
        assert_eq!(store.vertex_count(), 3);
        assert!(store.last_seen(&pair("a", "b")).is_none());
        assert!(store.check_invariants(Some(3)).is_ok());

        assert_eq!(store.evict_before(3), 0);
        assert_eq!(store.evict_before(100), 2);
        assert!(store.is_empty());
        assert_eq!(store.vertex_count(), 0);
    }

    #[test]
    fn stale_survivor_is_reported() {
        let mut store = OrderedEdgeStore::new();
        store.upsert(pair("a", "b"), 1);
        assert!(matches!(
            store.check_invariants(Some(5)),
            Err(InvariantViolation::StaleEdge { last_seen: 1, .. })
        ));
    }

    #[test]
    fn search_kind_round_trips_through_str() {
        assert_eq!("binary".parse::<SearchKind>(), Ok(SearchKind::Binary));
        assert_eq!(SearchKind::Backward.to_string(), "backward");
        assert!("skiplist".parse::<SearchKind>().is_err());
    }
}
