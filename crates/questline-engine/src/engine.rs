//! The storyline engine.
//!
//! A cooperative polling loop: each [`StorylineEngine::step`] performs one
//! poll of one attempt and returns immediately. Handler phases go to the
//! installed [`Storyline`]; agent-facing phases go to the [`AgentDesk`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use questline_core::client::{AgentId, GameClient};
use questline_core::clock::Clock;
use questline_core::desk::AgentDesk;
use questline_core::error::EngineError;
use questline_core::gate::TimeGate;
use questline_core::storyline::{
    PhaseOutcome, PhaseTick, Storyline, StorylineContext, StorylineState,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;

/// How a finished attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The mission was handed in.
    Completed,
    /// The agent was blacklisted for the session.
    Blacklisted,
}

/// One storyline attempt: the engine-owned record of phase and time gate.
#[derive(Debug, Clone)]
pub struct StorylineAttempt {
    context: StorylineContext,
    state: StorylineState,
    gate: TimeGate,
    outcome: Option<AttemptOutcome>,
}

impl StorylineAttempt {
    fn new(context: StorylineContext) -> Self {
        Self {
            context,
            state: StorylineState::Arm,
            gate: TimeGate::open(),
            outcome: None,
        }
    }

    /// The agent and mission being processed.
    #[must_use]
    pub const fn context(&self) -> &StorylineContext {
        &self.context
    }

    /// The current phase.
    #[must_use]
    pub const fn state(&self) -> StorylineState {
        self.state
    }

    /// The current time gate.
    #[must_use]
    pub const fn gate(&self) -> TimeGate {
        self.gate
    }

    /// How the attempt ended, once it has.
    #[must_use]
    pub const fn outcome(&self) -> Option<AttemptOutcome> {
        self.outcome
    }

    /// Read-only view of the attempt.
    #[must_use]
    pub fn view(&self) -> AttemptView {
        AttemptView {
            attempt_id: self.context.attempt_id,
            agent_id: self.context.agent_id,
            mission_name: self.context.mission_name.clone(),
            state: self.state,
            not_before: self.gate.not_before(),
            outcome: self.outcome,
        }
    }

    fn finish(&mut self, outcome: AttemptOutcome) {
        self.state = StorylineState::Done;
        self.outcome = Some(outcome);
    }
}

/// Read-only view of a storyline attempt.
#[derive(Debug, Serialize)]
pub struct AttemptView {
    /// The attempt identifier.
    pub attempt_id: Uuid,
    /// The storyline agent.
    pub agent_id: AgentId,
    /// The mission name.
    pub mission_name: String,
    /// Current phase.
    pub state: StorylineState,
    /// When the next action may be taken, if gated.
    pub not_before: Option<DateTime<Utc>>,
    /// How the attempt ended, if it has.
    pub outcome: Option<AttemptOutcome>,
}

fn registry_key(mission_name: &str) -> String {
    mission_name.trim().to_lowercase()
}

/// Registry of storyline handlers plus the session blacklist.
pub struct StorylineEngine {
    config: EngineConfig,
    storylines: HashMap<String, Box<dyn Storyline>>,
    blacklist: HashSet<AgentId>,
}

impl std::fmt::Debug for StorylineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorylineEngine")
            .field("config", &self.config)
            .field("storylines", &self.storylines.keys().collect::<Vec<_>>())
            .field("blacklist", &self.blacklist)
            .finish()
    }
}

impl StorylineEngine {
    /// Creates an engine with no handlers installed.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            storylines: HashMap::new(),
            blacklist: HashSet::new(),
        }
    }

    /// Installs `storyline` for `mission_name`, replacing any previous one.
    /// Mission names are matched case-insensitively.
    pub fn register(&mut self, mission_name: &str, storyline: Box<dyn Storyline>) {
        self.storylines.insert(registry_key(mission_name), storyline);
    }

    /// Installs every `(mission name, handler)` pair.
    pub fn register_all<'a>(
        &mut self,
        storylines: impl IntoIterator<Item = (&'a str, Box<dyn Storyline>)>,
    ) {
        for (mission_name, storyline) in storylines {
            self.register(mission_name, storyline);
        }
    }

    /// Whether a handler is installed for `mission_name`.
    #[must_use]
    pub fn handles(&self, mission_name: &str) -> bool {
        self.storylines.contains_key(&registry_key(mission_name))
    }

    /// Whether `agent_id` was blacklisted during this session.
    #[must_use]
    pub fn is_blacklisted(&self, agent_id: AgentId) -> bool {
        self.blacklist.contains(&agent_id)
    }

    /// Starts a new attempt in the `Arm` phase with an open gate.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::AgentBlacklisted` if the agent was blacklisted
    /// earlier in the session, or `EngineError::UnknownStoryline` if no
    /// handler is installed for the mission.
    pub fn begin(
        &self,
        agent_id: AgentId,
        mission_name: &str,
    ) -> Result<StorylineAttempt, EngineError> {
        if self.is_blacklisted(agent_id) {
            return Err(EngineError::AgentBlacklisted(agent_id));
        }
        if !self.handles(mission_name) {
            return Err(EngineError::UnknownStoryline(mission_name.to_owned()));
        }

        let attempt = StorylineAttempt::new(StorylineContext::new(agent_id, mission_name));
        info!(
            attempt_id = %attempt.context.attempt_id,
            %agent_id,
            mission_name,
            "storyline attempt started"
        );
        Ok(attempt)
    }

    /// Polls `attempt` once and returns its phase afterwards.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownStoryline` if the attempt's handler has
    /// been removed from the registry.
    pub fn step(
        &mut self,
        attempt: &mut StorylineAttempt,
        client: &dyn GameClient,
        desk: &dyn AgentDesk,
        clock: &dyn Clock,
    ) -> Result<StorylineState, EngineError> {
        let previous = attempt.state;

        if previous.is_handler_phase() {
            let storyline = self
                .storylines
                .get(&registry_key(&attempt.context.mission_name))
                .ok_or_else(|| {
                    EngineError::UnknownStoryline(attempt.context.mission_name.clone())
                })?;
            let tick = PhaseTick {
                context: &attempt.context,
                client,
                now: clock.now(),
                gate: attempt.gate,
            };
            let PhaseOutcome { next, gate } = dispatch(storyline.as_ref(), previous, &tick);
            attempt.state = next;
            attempt.gate = gate;
        } else {
            match previous {
                StorylineState::GotoAgent => {
                    if desk.travel_to_agent(&attempt.context) {
                        attempt.state = StorylineState::PreAcceptMission;
                    }
                }
                StorylineState::AcceptMission => {
                    if desk.accept_mission(&attempt.context) {
                        attempt.state = StorylineState::PostAcceptMission;
                    }
                }
                StorylineState::CompleteMission => {
                    if desk.complete_mission(&attempt.context) {
                        attempt.finish(AttemptOutcome::Completed);
                    }
                }
                StorylineState::BlacklistAgent => {
                    warn!(
                        attempt_id = %attempt.context.attempt_id,
                        agent_id = %attempt.context.agent_id,
                        "agent blacklisted for this session"
                    );
                    self.blacklist.insert(attempt.context.agent_id);
                    attempt.finish(AttemptOutcome::Blacklisted);
                }
                StorylineState::Done
                | StorylineState::Arm
                | StorylineState::PreAcceptMission
                | StorylineState::PostAcceptMission
                | StorylineState::ExecuteMission => {}
            }
        }

        if attempt.state == previous {
            debug!(attempt_id = %attempt.context.attempt_id, state = ?previous, "storyline polled");
        } else {
            info!(
                attempt_id = %attempt.context.attempt_id,
                agent_id = %attempt.context.agent_id,
                from = ?previous,
                to = ?attempt.state,
                "storyline phase changed"
            );
        }

        Ok(attempt.state)
    }

    /// Polls `attempt` until it finishes, sleeping the configured poll
    /// interval between polls.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Stalled` if the attempt has not finished after
    /// `max_ticks` polls, or any error from [`step`](Self::step).
    pub async fn run(
        &mut self,
        attempt: &mut StorylineAttempt,
        client: &dyn GameClient,
        desk: &dyn AgentDesk,
        clock: &dyn Clock,
    ) -> Result<AttemptOutcome, EngineError> {
        let mut ticks = 0;
        loop {
            if let Some(outcome) = attempt.outcome {
                return Ok(outcome);
            }
            if ticks >= self.config.max_ticks {
                return Err(EngineError::Stalled {
                    attempt_id: attempt.context.attempt_id,
                    ticks,
                });
            }

            self.step(attempt, client, desk, clock)?;
            ticks += 1;

            if attempt.outcome.is_none() {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
    }
}

fn dispatch(
    storyline: &dyn Storyline,
    state: StorylineState,
    tick: &PhaseTick<'_>,
) -> PhaseOutcome {
    match state {
        StorylineState::Arm => storyline.arm(tick),
        StorylineState::PreAcceptMission => storyline.pre_accept_mission(tick),
        StorylineState::PostAcceptMission => storyline.post_accept_mission(tick),
        StorylineState::ExecuteMission => storyline.execute_mission(tick),
        other => tick.transition(other),
    }
}
