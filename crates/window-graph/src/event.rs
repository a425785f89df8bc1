//! Parsed co-occurrence events.

use crate::pair::CanonicalPair;
use std::collections::BTreeSet;

/// Seconds since the Unix epoch.
pub type Timestamp = i64;

/// A single message's timestamp and its distinct tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: Timestamp,
    pub tags: BTreeSet<String>,
}

impl Event {
    pub fn new<I, S>(timestamp: Timestamp, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            timestamp,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Every unordered pair of distinct tags, each in canonical order.
    ///
    /// Tags are kept sorted, so pairs come out in lexicographic order of
    /// their first then second member.
    pub fn pairs(&self) -> impl Iterator<Item = CanonicalPair> + '_ {
        self.tags.iter().enumerate().flat_map(move |(i, a)| {
            self.tags
                .iter()
                .skip(i + 1)
                .filter_map(move |b| CanonicalPair::new(a, b))
        })
    }
}
