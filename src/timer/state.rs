use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::utils::format_clock;

pub const DURATION_CHOICES: [u32; 4] = [5, 10, 15, 20];
pub const DEFAULT_MINUTES: u32 = 5;

/// Radius of the SVG progress ring, in view units.
pub const RING_RADIUS: f64 = 110.0;

pub const COMPLETION_LABEL: &str = "Done 🙏";

pub fn ring_circumference() -> f64 {
    TAU * RING_RADIUS
}

pub fn is_supported_duration(minutes: u32) -> bool {
    DURATION_CHOICES.contains(&minutes)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Ignored,
    Running,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub selected_minutes: u32,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub display: String,
    pub action_label: String,
    pub progress: f64,
    pub ring_offset: f64,
    pub ring_circumference: f64,
}

#[derive(Debug, Clone)]
pub struct TimerState {
    pub status: TimerStatus,
    pub selected_minutes: u32,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(DEFAULT_MINUTES)
    }
}

impl TimerState {
    /// Unsupported durations fall back to [`DEFAULT_MINUTES`].
    pub fn new(minutes: u32) -> Self {
        let minutes = if is_supported_duration(minutes) {
            minutes
        } else {
            DEFAULT_MINUTES
        };
        let total = u64::from(minutes) * 60;
        Self {
            status: TimerStatus::Idle,
            selected_minutes: minutes,
            total_seconds: total,
            remaining_seconds: total,
        }
    }

    /// Ok(false) when the countdown is running and the selection is locked.
    pub fn select_duration(&mut self, minutes: u32) -> Result<bool> {
        if !is_supported_duration(minutes) {
            bail!("unsupported duration: {minutes} minutes");
        }
        if self.status == TimerStatus::Running {
            return Ok(false);
        }
        *self = Self::new(minutes);
        Ok(true)
    }

    pub fn start(&mut self) -> bool {
        if self.status != TimerStatus::Idle || self.remaining_seconds == 0 {
            return false;
        }
        self.status = TimerStatus::Running;
        true
    }

    /// Halts the countdown in place; the remaining time is kept for a resume.
    pub fn stop(&mut self) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.status = TimerStatus::Idle;
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.status != TimerStatus::Running {
            return TickOutcome::Ignored;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.status = TimerStatus::Completed;
            TickOutcome::Completed
        } else {
            TickOutcome::Running
        }
    }

    pub fn reset_to_selection(&mut self) {
        *self = Self::new(self.selected_minutes);
    }

    /// Fraction of the selected duration already consumed.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        let elapsed = self.total_seconds.saturating_sub(self.remaining_seconds);
        elapsed as f64 / self.total_seconds as f64
    }

    /// Stroke dash offset for the ring: full circumference at zero progress.
    pub fn ring_offset(&self) -> f64 {
        ring_circumference() * (1.0 - self.progress())
    }

    pub fn display(&self) -> String {
        match self.status {
            TimerStatus::Completed => COMPLETION_LABEL.to_string(),
            _ => format_clock(self.remaining_seconds),
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            status: self.status,
            selected_minutes: self.selected_minutes,
            total_seconds: self.total_seconds,
            remaining_seconds: self.remaining_seconds,
            display: self.display(),
            action_label: match self.status {
                TimerStatus::Running => "Pause",
                _ => "Start",
            }
            .to_string(),
            progress: self.progress(),
            ring_offset: self.ring_offset(),
            ring_circumference: ring_circumference(),
        }
    }
}
