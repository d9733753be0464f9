pub mod commands;
pub mod controller;
pub mod state;

pub use controller::BreathingController;
pub use state::{
    BreathingPattern, BreathingPhase, BreathingSnapshot, BreathingState, OrbState, IDLE_LABEL,
};
