//! Engine error types.
//!
//! Handler phase functions never fail; everything here is raised by the
//! engine that drives them.

use thiserror::Error;
use uuid::Uuid;

use crate::client::AgentId;

/// Top-level storyline engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No handler is registered for the mission name.
    #[error("no storyline handler registered for mission {0:?}")]
    UnknownStoryline(String),

    /// The agent was blacklisted earlier in this session.
    #[error("agent {0} is blacklisted for this session")]
    AgentBlacklisted(AgentId),

    /// An attempt did not settle within the configured tick budget.
    #[error("storyline attempt {attempt_id} did not settle after {ticks} ticks")]
    Stalled {
        /// The attempt that stalled.
        attempt_id: Uuid,
        /// Number of ticks spent.
        ticks: u32,
    },
}
