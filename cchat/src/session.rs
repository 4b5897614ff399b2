//! Chat session lifecycle.
//!
//! ```text
//! ACTIVE ──► PAUSED ──► ACTIVE
//!   │          │
//!   ├──► COMPLETED ──► CLOSED
//!   └──────────┴─────► CLOSED
//! ```
//!
//! ```rust
//! use cchat::{ChatSession, SessionStatus};
//!
//! let mut session = ChatSession::new("user-1", "gpt-4o-mini");
//! assert!(session.ensure_interactive().is_ok());
//!
//! session.transition_to(SessionStatus::Completed).expect("active can complete");
//! assert!(session.ensure_interactive().is_err());
//! assert!(session.transition_to(SessionStatus::Active).is_err());
//! ```

use std::fmt::{Display, Formatter};

use ccommon::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Closed,
}

impl SessionStatus {
    pub fn allowed_transitions(self) -> &'static [SessionStatus] {
        match self {
            Self::Active => &[Self::Paused, Self::Completed, Self::Closed],
            Self::Paused => &[Self::Active, Self::Closed],
            Self::Completed => &[Self::Closed],
            Self::Closed => &[],
        }
    }

    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Whether new user messages may be appended.
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Closed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
            Self::Closed => "CLOSED",
        }
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: SessionStatus,
    pub user_id: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(user_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_id(SessionId::generate(), user_id, model)
    }

    pub fn with_id(
        id: impl Into<SessionId>,
        user_id: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: None,
            status: SessionStatus::Active,
            user_id: user_id.into(),
            model: model.into(),
            system_prompt: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.status.is_interactive()
    }

    pub fn ensure_interactive(&self) -> Result<(), ChatError> {
        if self.status.is_interactive() {
            Ok(())
        } else {
            Err(ChatError::session_not_interactive(&self.id, self.status))
        }
    }

    pub fn transition_to(&mut self, next: SessionStatus) -> Result<(), ChatError> {
        if !self.status.can_transition_to(next) {
            return Err(ChatError::illegal_transition(self.status, next));
        }

        self.status = next;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}
