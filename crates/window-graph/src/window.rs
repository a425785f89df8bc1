//! Trailing time window anchored at the stream's own high-water mark.
//!
//! Windows follow the newest accepted timestamp, not wall-clock time, so a
//! replay of the same input always produces the same output.

use crate::error::WindowError;
use crate::event::Timestamp;
use std::num::NonZeroU32;

/// Window length used when nothing else is configured.
pub const DEFAULT_WINDOW_SECS: u32 = 60;

const DEFAULT_LENGTH: NonZeroU32 = match NonZeroU32::new(DEFAULT_WINDOW_SECS) {
    Some(length) => length,
    None => panic!("default window length must be non-zero"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    latest: Option<Timestamp>,
    length: NonZeroU32,
}

impl WindowPolicy {
    pub fn new(length_secs: u32) -> Result<Self, WindowError> {
        let length = NonZeroU32::new(length_secs).ok_or(WindowError::ZeroLength)?;
        Ok(Self {
            latest: None,
            length,
        })
    }

    pub fn length(&self) -> Timestamp {
        Timestamp::from(self.length.get())
    }

    /// Newest accepted timestamp, `None` until the first one arrives.
    pub fn latest(&self) -> Option<Timestamp> {
        self.latest
    }

    /// True iff `timestamp` is less than one window length older than the
    /// newest timestamp seen. Anything is in-window before the first event.
    pub fn is_in_window(&self, timestamp: Timestamp) -> bool {
        match self.latest {
            Some(latest) => latest.saturating_sub(timestamp) < self.length(),
            None => true,
        }
    }

    /// Move the high-water mark forward. Never moves it back.
    pub fn advance(&mut self, timestamp: Timestamp) {
        self.latest = Some(match self.latest {
            Some(latest) => latest.max(timestamp),
            None => timestamp,
        });
    }

    /// Edges last seen strictly before this are expired.
    pub fn threshold(&self) -> Option<Timestamp> {
        self.latest.map(|latest| latest.saturating_sub(self.length()))
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            latest: None,
            length: DEFAULT_LENGTH,
        }
    }
}
