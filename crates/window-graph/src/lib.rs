//! Sliding-window tag co-occurrence graph.
//!
//! Events carry a timestamp and a set of tags. Every unordered pair of tags
//! in an accepted event becomes an edge that stays live until it falls out
//! of the trailing window anchored at the newest timestamp seen so far.
//! After each event the tracker reports the average vertex degree of the
//! live graph.
//!
//! The default backend is [`OrderedEdgeStore`], which keeps edges sorted by
//! last-seen time so eviction is a prefix scan and the degree table is
//! maintained incrementally. [`RescanGraph`] implements the same contract by
//! walking the whole adjacency map on every event and is kept as a
//! correctness oracle.

pub mod aggregate;
pub mod backend;
pub mod degree;
pub mod error;
pub mod event;
pub mod pair;
pub mod rescan;
pub mod store;
pub mod tracker;
pub mod window;

pub use aggregate::AverageDegree;
pub use backend::{BackendKind, EdgeBackend, Upsert};
pub use degree::DegreeTable;
pub use error::{InvariantViolation, UnknownKind, WindowError};
pub use event::{Event, Timestamp};
pub use pair::CanonicalPair;
pub use rescan::RescanGraph;
pub use store::{BackwardScan, BinarySearch, Edge, InsertionSearch, OrderedEdgeStore, SearchKind};
pub use tracker::{DegreeTracker, Outcome, TrackerState};
pub use window::{WindowPolicy, DEFAULT_WINDOW_SECS};
