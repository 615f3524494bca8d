//! Questline Core — shared storyline abstractions.
//!
//! This crate defines the phase vocabulary, the time gate, the
//! readiness-gated window pattern, and the capability traits through which
//! storyline handlers observe and command the game client. It contains no
//! infrastructure code.

pub mod client;
pub mod clock;
pub mod desk;
pub mod error;
pub mod gate;
pub mod storyline;
pub mod window;
