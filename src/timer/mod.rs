pub mod commands;
pub mod controller;
pub mod state;

pub use controller::TimerController;
pub use state::{
    ring_circumference, TickOutcome, TimerSnapshot, TimerState, TimerStatus, DURATION_CHOICES,
};
