//! Shared test fakes and utilities for the Questline storyline engine.

mod client;
mod clock;
mod desk;

pub use client::RecordingGameClient;
pub use clock::{FixedClock, ManualClock};
pub use desk::ScriptedAgentDesk;
