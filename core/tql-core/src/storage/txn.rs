//! Transaction identifiers.
//!
//! [`TxnIdOracle`] hands out monotonically increasing [`TxnId`]s, starting at 1.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Store-side transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxnId(pub u64);

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

/// A source of monotonically increasing transaction ids.
///
/// Older transactions have smaller ids.
#[derive(Debug)]
pub struct TxnIdOracle {
    /// The last id handed out. Starts at 0, so the first id is 1.
    last: AtomicU64,
}

impl TxnIdOracle {
    pub fn new(start: u64) -> Self {
        Self {
            last: AtomicU64::new(start),
        }
    }

    /// Allocate and return the next id.
    pub fn next(&self) -> TxnId {
        TxnId(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Read the last allocated id without incrementing.
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

impl Default for TxnIdOracle {
    fn default() -> Self {
        Self::new(0)
    }
}
