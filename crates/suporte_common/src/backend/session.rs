//! Session token and the per-call phase machine.

use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Backend-issued session token, valid for one composite operation
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub(crate) fn new(token: String) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &super::mask_secret(&self.token))
            .finish()
    }
}

/// Phase of one composite operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Authenticating,
    Authenticated,
    Operating,
    Closing,
    Done,
    Error,
}

impl SessionPhase {
    pub fn can_advance_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, next),
            (Idle, Authenticating)
                | (Authenticating, Authenticated)
                | (Authenticating, Error)
                | (Authenticated, Operating)
                | (Operating, Closing)
                | (Operating, Error)
                | (Error, Closing)
                | (Closing, Done)
                | (Closing, Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Done | SessionPhase::Error)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Authenticating => "authenticating",
            SessionPhase::Authenticated => "authenticated",
            SessionPhase::Operating => "operating",
            SessionPhase::Closing => "closing",
            SessionPhase::Done => "done",
            SessionPhase::Error => "error",
        };
        f.write_str(name)
    }
}

/// Phases visited by one composite operation, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTrace {
    phases: Vec<SessionPhase>,
}

impl Default for PhaseTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTrace {
    pub fn new() -> Self {
        Self {
            phases: vec![SessionPhase::Idle],
        }
    }

    pub fn current(&self) -> SessionPhase {
        *self.phases.last().unwrap_or(&SessionPhase::Idle)
    }

    pub fn phases(&self) -> &[SessionPhase] {
        &self.phases
    }

    pub fn visited(&self, phase: SessionPhase) -> bool {
        self.phases.contains(&phase)
    }

    pub(crate) fn advance(&mut self, next: SessionPhase) {
        let current = self.current();
        if !current.can_advance_to(next) {
            warn!("Invalid session phase transition {} -> {}", current, next);
            debug_assert!(false, "invalid session phase transition {current} -> {next}");
        }
        self.phases.push(next);
    }
}

impl fmt::Display for PhaseTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.phases.iter().map(|p| p.to_string()).collect();
        f.write_str(&rendered.join(" -> "))
    }
}
