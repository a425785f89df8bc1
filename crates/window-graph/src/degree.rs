//! Per-vertex degree counts for the live graph.

use crate::error::InvariantViolation;
use std::collections::HashMap;

/// Vertex → number of live incident edges. A vertex whose degree drops to
/// zero is removed, so `vertex_count` is always the live vertex count.
#[derive(Debug, Default, Clone)]
pub struct DegreeTable {
    degrees: HashMap<String, usize>,
    degree_sum: usize,
}

impl DegreeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, vertex: &str) {
        match self.degrees.get_mut(vertex) {
            Some(degree) => *degree += 1,
            None => {
                self.degrees.insert(vertex.to_string(), 1);
            }
        }
        self.degree_sum += 1;
    }

    /// Decrementing an absent vertex is a no-op.
    pub fn decrement(&mut self, vertex: &str) {
        let Some(degree) = self.degrees.get_mut(vertex) else {
            tracing::warn!(vertex, "decrement on vertex with no live edges");
            return;
        };
        *degree -= 1;
        self.degree_sum -= 1;
        if *degree == 0 {
            self.degrees.remove(vertex);
        }
    }

    pub fn degree(&self, vertex: &str) -> usize {
        self.degrees.get(vertex).copied().unwrap_or(0)
    }

    pub fn vertex_count(&self) -> usize {
        self.degrees.len()
    }

    /// Running total of all degrees, kept alongside the map.
    pub fn degree_sum(&self) -> usize {
        self.degree_sum
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.degrees.iter().map(|(v, d)| (v.as_str(), *d))
    }

    pub fn clear(&mut self) {
        self.degrees.clear();
        self.degree_sum = 0;
    }

    /// Recomputes the degree sum from scratch and checks there are no
    /// zero-degree entries.
    pub fn check(&self) -> Result<(), InvariantViolation> {
        if let Some((vertex, _)) = self.degrees.iter().find(|(_, d)| **d == 0) {
            return Err(InvariantViolation::ZeroDegreeVertex {
                vertex: vertex.clone(),
            });
        }
        let recomputed: usize = self.degrees.values().sum();
        if recomputed != self.degree_sum {
            return Err(InvariantViolation::DegreeSum {
                degree_sum: recomputed,
                edges: self.degree_sum / 2,
            });
        }
        Ok(())
    }
}
