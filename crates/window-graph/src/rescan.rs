//! Full-rescan backend.
//!
//! Keeps a symmetric adjacency map and recomputes everything by walking it:
//! eviction visits every adjacency, and the edge count is derived from the
//! total degree. Much slower than [`crate::OrderedEdgeStore`] but simple
//! enough to serve as an oracle in tests and in the `verify` command.

use crate::backend::{EdgeBackend, Upsert};
use crate::error::InvariantViolation;
use crate::event::Timestamp;
use crate::pair::CanonicalPair;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct RescanGraph {
    adjacency: HashMap<String, HashMap<String, Timestamp>>,
}

impl RescanGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn link(&mut self, from: &str, to: &str, timestamp: Timestamp) {
        self.adjacency
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), timestamp);
    }

    fn unlink(&mut self, from: &str, to: &str) {
        if let Some(neighbors) = self.adjacency.get_mut(from) {
            neighbors.remove(to);
            if neighbors.is_empty() {
                self.adjacency.remove(from);
            }
        }
    }

    fn total_degree(&self) -> usize {
        self.adjacency.values().map(HashMap::len).sum()
    }
}

impl EdgeBackend for RescanGraph {
    fn upsert(&mut self, pair: CanonicalPair, timestamp: Timestamp) -> Upsert {
        let (low, high) = pair.endpoints();
        let outcome = match self.last_seen(&pair) {
            Some(previous) if timestamp <= previous => return Upsert::Unchanged,
            Some(_) => Upsert::Refreshed,
            None => Upsert::Inserted,
        };
        self.link(low, high, timestamp);
        self.link(high, low, timestamp);
        outcome
    }

    fn evict_before(&mut self, threshold: Timestamp) -> usize {
        let stale: Vec<(String, String)> = self
            .adjacency
            .iter()
            .flat_map(|(vertex, neighbors)| {
                neighbors
                    .iter()
                    .filter(move |(neighbor, last_seen)| {
                        **last_seen < threshold && vertex < *neighbor
                    })
                    .map(move |(neighbor, _)| (vertex.clone(), neighbor.clone()))
            })
            .collect();

        for (vertex, neighbor) in &stale {
            self.unlink(vertex, neighbor);
            self.unlink(neighbor, vertex);
        }
        stale.len()
    }

    fn edge_count(&self) -> usize {
        self.total_degree() / 2
    }

    fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    fn degree(&self, vertex: &str) -> usize {
        self.adjacency.get(vertex).map_or(0, HashMap::len)
    }

    fn last_seen(&self, pair: &CanonicalPair) -> Option<Timestamp> {
        self.adjacency
            .get(pair.low())
            .and_then(|neighbors| neighbors.get(pair.high()))
            .copied()
    }

    fn check_invariants(&self, threshold: Option<Timestamp>) -> Result<(), InvariantViolation> {
        for (vertex, neighbors) in &self.adjacency {
            if neighbors.is_empty() {
                return Err(InvariantViolation::ZeroDegreeVertex {
                    vertex: vertex.clone(),
                });
            }
            for (neighbor, &last_seen) in neighbors {
                let mirrored = self
                    .adjacency
                    .get(neighbor)
                    .and_then(|back| back.get(vertex));
                if mirrored != Some(&last_seen) {
                    return Err(InvariantViolation::IndexOutOfSync {
                        index: self.total_degree(),
                        sequence: self.edge_count(),
                    });
                }
                if let Some(threshold) = threshold {
                    if last_seen < threshold {
                        return Err(InvariantViolation::StaleEdge {
                            pair: format!("{vertex}|{neighbor}"),
                            last_seen,
                            threshold,
                        });
                    }
                }
            }
        }

        let total = self.total_degree();
        if total % 2 != 0 {
            return Err(InvariantViolation::DegreeSum {
                degree_sum: total,
                edges: self.edge_count(),
            });
        }
        Ok(())
    }
}
