//! Settlement periods.
//!
//! The host ledger orders operations into indivisible periods. Every call
//! applied within one period sees the same [`Period`]; the front-running
//! guard compares an offer's creation height against it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Height;

/// The settlement period currently being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub height: Height,
    /// Period timestamp. Signed authorizations expire against this.
    pub timestamp: DateTime<Utc>,
}

impl Period {
    #[must_use]
    pub fn genesis(timestamp: DateTime<Utc>) -> Self {
        Self {
            height: Height(0),
            timestamp,
        }
    }

    /// The following period. Timestamps never move backwards.
    #[must_use]
    pub fn next(self, timestamp: DateTime<Utc>) -> Self {
        Self {
            height: self.height.next(),
            timestamp: timestamp.max(self.timestamp),
        }
    }
}
