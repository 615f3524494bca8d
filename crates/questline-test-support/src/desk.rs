//! Scripted agent desk — an `AgentDesk` that answers from counters.

use std::sync::Mutex;

use questline_core::desk::AgentDesk;
use questline_core::storyline::StorylineContext;

#[derive(Debug, Default)]
struct DeskLog {
    travel_calls: u32,
    accept_calls: u32,
    complete_calls: u32,
}

/// An agent desk that reports each step finished after a configured number
/// of polls, and counts every call.
#[derive(Debug, Default)]
pub struct ScriptedAgentDesk {
    travel_polls: u32,
    accept_polls: u32,
    complete_polls: u32,
    log: Mutex<DeskLog>,
}

impl ScriptedAgentDesk {
    /// A desk where every step finishes on its first poll.
    #[must_use]
    pub fn immediate() -> Self {
        Self::with_polls(1, 1, 1)
    }

    /// A desk where travel, acceptance, and completion finish on the given
    /// poll (1-based) respectively.
    #[must_use]
    pub fn with_polls(travel: u32, accept: u32, complete: u32) -> Self {
        Self {
            travel_polls: travel,
            accept_polls: accept,
            complete_polls: complete,
            log: Mutex::new(DeskLog::default()),
        }
    }

    /// Number of `travel_to_agent` calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn travel_calls(&self) -> u32 {
        self.log.lock().unwrap().travel_calls
    }

    /// Number of `accept_mission` calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn accept_calls(&self) -> u32 {
        self.log.lock().unwrap().accept_calls
    }

    /// Number of `complete_mission` calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn complete_calls(&self) -> u32 {
        self.log.lock().unwrap().complete_calls
    }
}

impl AgentDesk for ScriptedAgentDesk {
    fn travel_to_agent(&self, _context: &StorylineContext) -> bool {
        let mut log = self.log.lock().unwrap();
        log.travel_calls += 1;
        log.travel_calls >= self.travel_polls
    }

    fn accept_mission(&self, _context: &StorylineContext) -> bool {
        let mut log = self.log.lock().unwrap();
        log.accept_calls += 1;
        log.accept_calls >= self.accept_polls
    }

    fn complete_mission(&self, _context: &StorylineContext) -> bool {
        let mut log = self.log.lock().unwrap();
        log.complete_calls += 1;
        log.complete_calls >= self.complete_polls
    }
}
