pub mod commands;

use serde::{Deserialize, Serialize};

/// Beads on a mala.
pub const MALA_TARGET: u64 = 108;

pub const MANTRA_LABEL: &str = "Om Shanti";
pub const COMPLETION_LABEL: &str = "Complete! 🎉";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MantraSnapshot {
    pub count: u64,
    pub target: u64,
    pub remaining: u64,
    pub progress_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementOutcome {
    pub count: u64,
    /// True only on the increment that lands exactly on the target.
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MantraTally {
    count: u64,
}

impl MantraTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn increment(&mut self) -> IncrementOutcome {
        self.count = self.count.saturating_add(1);
        IncrementOutcome {
            count: self.count,
            completed: self.count == MALA_TARGET,
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn snapshot(&self) -> MantraSnapshot {
        MantraSnapshot {
            count: self.count,
            target: MALA_TARGET,
            remaining: MALA_TARGET.saturating_sub(self.count),
            progress_percent: (self.count as f64 / MALA_TARGET as f64 * 100.0).min(100.0),
        }
    }
}
