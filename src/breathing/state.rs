use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::utils::format_clock;

pub const IDLE_LABEL: &str = "Begin";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BreathingPhase {
    Inhale,
    HoldIn,
    Exhale,
    HoldOut,
}

impl BreathingPhase {
    pub fn next(self) -> Self {
        match self {
            BreathingPhase::Inhale => BreathingPhase::HoldIn,
            BreathingPhase::HoldIn => BreathingPhase::Exhale,
            BreathingPhase::Exhale => BreathingPhase::HoldOut,
            BreathingPhase::HoldOut => BreathingPhase::Inhale,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BreathingPhase::Inhale => "Inhale",
            BreathingPhase::HoldIn | BreathingPhase::HoldOut => "Hold",
            BreathingPhase::Exhale => "Exhale",
        }
    }

    /// The orb stays expanded through the top hold and contracted through
    /// the bottom one.
    pub fn orb(self) -> OrbState {
        match self {
            BreathingPhase::Inhale | BreathingPhase::HoldIn => OrbState::In,
            BreathingPhase::Exhale | BreathingPhase::HoldOut => OrbState::Out,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OrbState {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum BreathingPattern {
    /// Four seconds for every phase.
    #[default]
    Box,
    /// Four second breaths with two second holds.
    ShortHold,
}

impl BreathingPattern {
    pub fn dwell(self, phase: BreathingPhase) -> Duration {
        let secs = match (self, phase) {
            (_, BreathingPhase::Inhale | BreathingPhase::Exhale) => 4,
            (BreathingPattern::Box, _) => 4,
            (BreathingPattern::ShortHold, _) => 2,
        };
        Duration::from_secs(secs)
    }

    pub fn cycle_length(self) -> Duration {
        [
            BreathingPhase::Inhale,
            BreathingPhase::HoldIn,
            BreathingPhase::Exhale,
            BreathingPhase::HoldOut,
        ]
        .into_iter()
        .map(|phase| self.dwell(phase))
        .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreathingSnapshot {
    pub active: bool,
    pub phase: Option<BreathingPhase>,
    pub label: String,
    pub orb: Option<OrbState>,
    pub elapsed_seconds: u64,
    pub elapsed_display: String,
    pub completed_cycles: u64,
    pub pattern: BreathingPattern,
}

#[derive(Debug, Clone)]
pub struct BreathingState {
    pub active: bool,
    pub session_id: Option<Uuid>,
    pub phase: Option<BreathingPhase>,
    pub elapsed_seconds: u64,
    /// Kept across sessions; only the elapsed clock restarts.
    pub completed_cycles: u64,
    pub pattern: BreathingPattern,
}

impl BreathingState {
    pub fn new(pattern: BreathingPattern) -> Self {
        Self {
            active: false,
            session_id: None,
            phase: None,
            elapsed_seconds: 0,
            completed_cycles: 0,
            pattern,
        }
    }

    /// Returns false and changes nothing when a session is already running.
    pub fn begin_session(&mut self, session_id: Uuid) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.session_id = Some(session_id);
        self.phase = Some(BreathingPhase::Inhale);
        self.elapsed_seconds = 0;
        true
    }

    pub fn is_current(&self, session_id: Uuid) -> bool {
        self.active && self.session_id == Some(session_id)
    }

    /// How long the current phase lasts, if a session is running.
    pub fn current_dwell(&self) -> Option<Duration> {
        match (self.active, self.phase) {
            (true, Some(phase)) => Some(self.pattern.dwell(phase)),
            _ => None,
        }
    }

    /// Move to the next phase. Stale sessions are refused so a transition
    /// that wakes after `stop` has no effect.
    pub fn advance_phase(&mut self, session_id: Uuid) -> Option<BreathingPhase> {
        if !self.is_current(session_id) {
            return None;
        }
        let current = self.phase?;
        if current == BreathingPhase::HoldOut {
            self.completed_cycles += 1;
        }
        let next = current.next();
        self.phase = Some(next);
        Some(next)
    }

    pub fn tick_elapsed(&mut self, session_id: Uuid) -> Option<u64> {
        if !self.is_current(session_id) {
            return None;
        }
        self.elapsed_seconds += 1;
        Some(self.elapsed_seconds)
    }

    /// Returns false when nothing was running.
    pub fn stop(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.session_id = None;
        self.phase = None;
        true
    }

    pub fn snapshot(&self) -> BreathingSnapshot {
        BreathingSnapshot {
            active: self.active,
            phase: self.phase,
            label: self
                .phase
                .map(BreathingPhase::label)
                .unwrap_or(IDLE_LABEL)
                .to_string(),
            orb: self.phase.map(BreathingPhase::orb),
            elapsed_seconds: self.elapsed_seconds,
            elapsed_display: format_clock(self.elapsed_seconds),
            completed_cycles: self.completed_cycles,
            pattern: self.pattern,
        }
    }
}
