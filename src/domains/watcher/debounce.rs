//! Idle/armed debounce state machine.
//!
//! The machine owns no timer. The caller feeds it the current instant on
//! every event and asks it whether the deadline has passed; the event loop
//! in `service.rs` does the actual sleeping.

use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Armed { deadline: Instant },
}

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: DebounceState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, DebounceState::Armed { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Idle => None,
            DebounceState::Armed { deadline } => Some(deadline),
        }
    }

    /// Arm, or re-arm, the deadline relative to `now`. Returns the new deadline.
    pub fn on_event(&mut self, now: Instant) -> Instant {
        let deadline = now + self.delay;
        self.state = DebounceState::Armed { deadline };
        deadline
    }

    /// Fire if armed and the deadline has passed.
    ///
    /// Returns true exactly once per armed period; the machine is idle afterwards.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Armed { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }
}
