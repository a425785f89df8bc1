//! Error types for the window graph.

use crate::event::Timestamp;
use thiserror::Error;

/// Rejected window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window length must be at least one second")]
    ZeroLength,
}

/// A broken internal invariant. Always a programming defect, never a
/// runtime condition to recover from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("degree sum {degree_sum} does not match twice the edge count {edges}")]
    DegreeSum { degree_sum: usize, edges: usize },

    #[error("edge index holds {index} entries but the sequence holds {sequence}")]
    IndexOutOfSync { index: usize, sequence: usize },

    #[error("edge {pair} appears more than once")]
    DuplicateEdge { pair: String },

    #[error("edges out of order at position {position}")]
    Unsorted { position: usize },

    #[error("edge {pair} last seen at {last_seen} survived eviction threshold {threshold}")]
    StaleEdge {
        pair: String,
        last_seen: Timestamp,
        threshold: Timestamp,
    },

    #[error("vertex {vertex} is stored with degree zero")]
    ZeroDegreeVertex { vertex: String },
}

/// A backend or search strategy name that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what} '{value}'")]
pub struct UnknownKind {
    pub what: &'static str,
    pub value: String,
}
