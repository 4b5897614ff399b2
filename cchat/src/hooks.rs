//! Turn lifecycle hooks for the chat orchestrator.
//!
//! ```rust
//! use cchat::{ChatTurnHooks, NoopChatTurnHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ChatTurnHooks) {}
//!
//! assert_hooks_trait(&NoopChatTurnHooks);
//! ```

use std::time::Duration;

use ccommon::{SessionId, TraceId};

use crate::{ChatError, ChatTurnResult};

pub trait ChatTurnHooks: Send + Sync {
    fn on_turn_start(&self, _session_id: &SessionId, _trace_id: &TraceId) {}

    fn on_turn_success(&self, _result: &ChatTurnResult, _elapsed: Duration) {}

    fn on_turn_failure(
        &self,
        _session_id: &SessionId,
        _trace_id: &TraceId,
        _error: &ChatError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChatTurnHooks;

impl ChatTurnHooks for NoopChatTurnHooks {}
