//! Conversation state for one chat session

use crate::config::ChatSettings;
use crate::roles;
use crate::{IrisError, Result};
use std::fmt;

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// The person typing
    User,
    /// The chat service
    Assistant,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    /// Who said it
    pub speaker: Speaker,
    /// What was said
    pub text: String,
}

impl ConversationTurn {
    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Where the session is in a request cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    /// Waiting for user input
    #[default]
    Idle,
    /// A question was sent and the answer is streaming in
    AwaitingResponse,
    /// The last answer was committed
    Completed,
    /// The last request failed and was rolled back
    Failed,
}

/// Transcript and selected role of one session
#[derive(Debug, Clone)]
pub struct SessionState {
    turns: Vec<ConversationTurn>,
    role: String,
    phase: RequestPhase,
    reset_on_role_change: bool,
}

impl SessionState {
    /// Start a session with the configured default role
    pub fn new(settings: &ChatSettings) -> Result<Self> {
        let mut session = Self {
            turns: Vec::new(),
            role: String::new(),
            phase: RequestPhase::Idle,
            reset_on_role_change: settings.reset_on_role_change,
        };
        session.select_role(&settings.default_role)?;
        tracing::info!(target: "app", "Initialized new chat session as '{}'", session.role);
        Ok(session)
    }

    /// Transcript so far, oldest first
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Currently selected role id
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Current request phase
    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: RequestPhase) {
        tracing::trace!(target: "app", "Request phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Append a turn to the transcript
    pub fn append_turn(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Remove and return the most recent turn
    pub fn pop_last_turn(&mut self) -> Option<ConversationTurn> {
        self.turns.pop()
    }

    /// Clear the transcript
    pub fn reset_turns(&mut self) {
        self.turns.clear();
    }

    /// Switch to another registered role
    ///
    /// Unknown roles are rejected and leave the session untouched. Switching
    /// to a different role clears the transcript when the session was
    /// configured to do so. Returns whether the transcript was cleared.
    pub fn select_role(&mut self, role: &str) -> Result<bool> {
        if !roles::is_known_role(role) {
            return Err(IrisError::validation(format!("Unknown role '{}'", role)));
        }
        if self.role == role {
            return Ok(false);
        }

        let previous = std::mem::replace(&mut self.role, role.to_string());
        let cleared = self.reset_on_role_change && !previous.is_empty() && !self.turns.is_empty();
        if cleared {
            self.reset_turns();
        }
        if !previous.is_empty() {
            tracing::info!(
                target: "app",
                "Role changed from '{}' to '{}' (department: {}){}",
                previous,
                role,
                roles::get_department_for_role(role),
                if cleared { ", transcript cleared" } else { "" }
            );
        }
        Ok(cleared)
    }
}
