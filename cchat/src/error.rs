//! Chat-layer errors and classification.
//!
//! ```rust
//! use cchat::{ChatError, ChatErrorKind};
//! use cprovider::ProviderError;
//!
//! let error: ChatError = ProviderError::timeout("dispatch exceeded 60s").into();
//! assert_eq!(error.kind, ChatErrorKind::ProviderTimeout);
//! assert!(error.retryable);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use ccommon::SessionId;
use cprovider::ProviderError;

use crate::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    SessionNotFound,
    SessionNotInteractive,
    IllegalTransition,
    TurnInProgress,
    InvalidRequest,
    Provider,
    ProviderTimeout,
    Store,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn session_not_found(session_id: &SessionId) -> Self {
        Self::new(
            ChatErrorKind::SessionNotFound,
            format!("session '{session_id}' does not exist"),
        )
    }

    pub fn session_not_interactive(session_id: &SessionId, status: SessionStatus) -> Self {
        Self::new(
            ChatErrorKind::SessionNotInteractive,
            format!("session '{session_id}' is {status} and does not accept messages"),
        )
    }

    pub fn illegal_transition(from: SessionStatus, to: SessionStatus) -> Self {
        Self::new(
            ChatErrorKind::IllegalTransition,
            format!("cannot move session from {from} to {to}"),
        )
    }

    pub fn turn_in_progress(session_id: &SessionId) -> Self {
        Self::new(
            ChatErrorKind::TurnInProgress,
            format!("session '{session_id}' already has a turn in flight"),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Provider, message)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Store, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Cancelled, message)
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Errors raised before the turn touched the store or the sink.
    pub fn is_pre_turn(&self) -> bool {
        matches!(
            self.kind,
            ChatErrorKind::SessionNotFound
                | ChatErrorKind::SessionNotInteractive
                | ChatErrorKind::TurnInProgress
                | ChatErrorKind::InvalidRequest
        )
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        let kind = if value.is_timeout() {
            ChatErrorKind::ProviderTimeout
        } else {
            ChatErrorKind::Provider
        };

        ChatError::new(kind, value.to_string()).with_retryable(value.retryable)
    }
}
