//! Average-degree metric.

use serde::Serialize;
use std::fmt;

/// `2 × edges / vertices` for the live graph, `0.00` when it is empty.
///
/// Displays with exactly two decimals, the form emitted per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AverageDegree {
    pub edges: usize,
    pub vertices: usize,
}

impl AverageDegree {
    pub fn new(edges: usize, vertices: usize) -> Self {
        Self { edges, vertices }
    }

    pub fn value(&self) -> f64 {
        if self.vertices == 0 {
            return 0.0;
        }
        (2 * self.edges) as f64 / self.vertices as f64
    }
}

impl fmt::Display for AverageDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}
