//! Agent desk abstraction: the engine-owned interactions with a mission agent.
//!
//! Like [`GameClient`](crate::client::GameClient) commands, each call is a
//! poll. It may start work in the client and returns `true` only once that
//! work is observed to be finished.

use crate::storyline::StorylineContext;

/// Travel and conversation capabilities driven by the storyline engine.
pub trait AgentDesk: Send + Sync {
    /// Moves towards the agent's station. Returns `true` once docked there.
    fn travel_to_agent(&self, context: &StorylineContext) -> bool;

    /// Accepts the offered mission. Returns `true` once accepted.
    fn accept_mission(&self, context: &StorylineContext) -> bool;

    /// Hands in the mission. Returns `true` once completed.
    fn complete_mission(&self, context: &StorylineContext) -> bool;
}
