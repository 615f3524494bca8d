//! Storyline phases and the handler capability contract.
//!
//! The engine owns the current [`StorylineState`] and [`TimeGate`] of every
//! attempt. On each poll it hands the matching [`Storyline`] operation a
//! [`PhaseTick`] and stores the [`PhaseOutcome`] it gets back.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::{AgentId, ClientCommand, GameClient};
use crate::gate::TimeGate;

/// Lifecycle phase of a storyline attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorylineState {
    /// Fit or board the ship to travel in.
    Arm,
    /// Travel to the agent's station.
    GotoAgent,
    /// Prepare anything the mission needs before accepting it.
    PreAcceptMission,
    /// Accept the mission with the agent.
    AcceptMission,
    /// Work that follows acceptance.
    PostAcceptMission,
    /// Run the mission itself.
    ExecuteMission,
    /// Hand the mission in.
    CompleteMission,
    /// Skip this agent for the rest of the session.
    BlacklistAgent,
    /// The attempt is over.
    Done,
}

impl StorylineState {
    /// Whether the phase is dispatched to the installed handler rather than
    /// handled by the engine itself.
    #[must_use]
    pub const fn is_handler_phase(self) -> bool {
        matches!(
            self,
            Self::Arm | Self::PreAcceptMission | Self::PostAcceptMission | Self::ExecuteMission
        )
    }
}

/// Identifies the agent and mission an attempt is working on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorylineContext {
    /// Unique identifier of this attempt, for tracing.
    pub attempt_id: Uuid,
    /// The storyline agent.
    pub agent_id: AgentId,
    /// The mission name as offered by the agent.
    pub mission_name: String,
}

impl StorylineContext {
    /// Creates a context with a fresh attempt identifier.
    #[must_use]
    pub fn new(agent_id: AgentId, mission_name: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::now_v7(),
            agent_id,
            mission_name: mission_name.into(),
        }
    }
}

/// Inputs to one phase function call.
#[derive(Clone, Copy)]
pub struct PhaseTick<'a> {
    /// The attempt being processed.
    pub context: &'a StorylineContext,
    /// Live client state and command sink.
    pub client: &'a dyn GameClient,
    /// The time of this poll.
    pub now: DateTime<Utc>,
    /// The attempt's time gate as of this poll.
    pub gate: TimeGate,
}

impl std::fmt::Debug for PhaseTick<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseTick")
            .field("context", self.context)
            .field("now", &self.now)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl PhaseTick<'_> {
    /// Whether the gate forbids acting on this poll.
    #[must_use]
    pub fn is_gated(&self) -> bool {
        !self.gate.is_open(self.now)
    }

    /// Moves to `next` leaving the gate untouched.
    #[must_use]
    pub fn transition(&self, next: StorylineState) -> PhaseOutcome {
        PhaseOutcome {
            next,
            gate: self.gate,
        }
    }

    /// Issues `command`, then moves to `next` with the gate closed for `delay`.
    #[must_use]
    pub fn command(
        &self,
        command: ClientCommand,
        next: StorylineState,
        delay: TimeDelta,
    ) -> PhaseOutcome {
        self.client.execute(command);
        PhaseOutcome {
            next,
            gate: self.gate.hold(self.now, delay),
        }
    }
}

/// What a phase function decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseOutcome {
    /// The phase the engine should store.
    pub next: StorylineState,
    /// The gate the engine should store.
    pub gate: TimeGate,
}

/// A storyline handler: one policy per mission type.
///
/// Every operation must return promptly. "Not ready yet" is expressed by
/// returning the current phase, never by blocking.
pub trait Storyline: Send + Sync {
    /// Equip for transit to the agent.
    fn arm(&self, tick: &PhaseTick<'_>) -> PhaseOutcome;

    /// Make sure the mission can be completed before accepting it.
    fn pre_accept_mission(&self, tick: &PhaseTick<'_>) -> PhaseOutcome;

    /// Work following acceptance.
    fn post_accept_mission(&self, tick: &PhaseTick<'_>) -> PhaseOutcome;

    /// The mission itself.
    fn execute_mission(&self, tick: &PhaseTick<'_>) -> PhaseOutcome;
}
