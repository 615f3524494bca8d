//! Questline Engine — drives storyline handlers through their phases.
//!
//! The engine owns every attempt's phase and time gate, dispatches handler
//! phases to the registered [`Storyline`](questline_core::storyline::Storyline),
//! and performs the agent-facing phases itself through an
//! [`AgentDesk`](questline_core::desk::AgentDesk).

pub mod config;
pub mod engine;

pub use config::{ConfigError, EngineConfig};
pub use engine::{AttemptOutcome, AttemptView, StorylineAttempt, StorylineEngine};
