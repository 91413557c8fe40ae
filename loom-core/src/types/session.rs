//! Session records and their status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::SessionId;

/// Session lifecycle status (§3 `status`, §4.4 state machine).
///
/// `active → completed` and `active → expired` are the only transitions;
/// `completed` and `expired` are terminal. There is no un-expire and no
/// un-complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = crate::error::LoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            other => Err(crate::error::LoomError::invalid_input(format!(
                "unknown session status: {other}"
            ))),
        }
    }
}

/// A design session (§3 `Session`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: String,
    pub initial_prompt: String,
    pub current_version: u64,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub status: SessionStatus,
    pub total_edits: u64,
}

impl Session {
    /// Constructs a brand-new active session at version 0 (version 1 is
    /// stored separately once the initial wireframe is available — see
    /// `SessionManager::create_session`).
    pub fn new(user_id: impl Into<String>, initial_prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: SessionId::new(),
            user_id: user_id.into(),
            initial_prompt: initial_prompt.into(),
            current_version: 0,
            created_at: now,
            last_activity: now,
            status: SessionStatus::Active,
            total_edits: 0,
        }
    }
}
