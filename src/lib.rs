//! Rolling average degree of a hashtag co-occurrence graph.
//!
//! The graph itself lives in the `window-graph` crate; this crate adds the
//! tweet record parser, the line-oriented pipeline and configuration used
//! by the `tagdegree` binary.

pub mod config;
pub mod pipeline;
pub mod record;

pub use config::{Config, LoggingConfig};
pub use pipeline::{build_tracker, run, verify, Divergence, RunSummary, VerifyReport};
pub use record::{parse_created_at, parse_record, RecordError};

pub use window_graph;
