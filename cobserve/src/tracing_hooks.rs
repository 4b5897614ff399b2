//! Tracing-based observability hooks for provider dispatch, function
//! execution, and chat turns.
//!
//! ```rust
//! use cchat::ChatTurnHooks;
//! use cobserve::TracingObservabilityHooks;
//!
//! fn accepts_turn_hooks(_hooks: &dyn ChatTurnHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_turn_hooks(&hooks);
//! ```

use std::time::Duration;

use cchat::{ChatError, ChatTurnHooks, ChatTurnResult};
use ccommon::{SessionId, TraceId};
use cprovider::{ProviderError, ProviderId, ProviderOperationHooks};
use ctooling::{FunctionCallResult, FunctionError, FunctionExecutionContext, FunctionHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: &ProviderId, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider = %provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, provider: &ProviderId, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl FunctionHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, name: &str, context: &FunctionExecutionContext) {
        tracing::info!(
            phase = "function",
            event = "execution_start",
            function = name,
            call_id = context.call_id.as_deref(),
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str())
        );
    }

    fn on_execution_success(
        &self,
        name: &str,
        context: &FunctionExecutionContext,
        _result: &FunctionCallResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "function",
            event = "execution_success",
            function = name,
            call_id = context.call_id.as_deref(),
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        name: &str,
        context: &FunctionExecutionContext,
        error: &FunctionError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "function",
            event = "execution_failure",
            function = name,
            call_id = context.call_id.as_deref(),
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }
}

impl ChatTurnHooks for TracingObservabilityHooks {
    fn on_turn_start(&self, session_id: &SessionId, trace_id: &TraceId) {
        tracing::info!(
            phase = "turn",
            event = "turn_start",
            session_id = %session_id,
            trace_id = %trace_id
        );
    }

    fn on_turn_success(&self, result: &ChatTurnResult, elapsed: Duration) {
        tracing::info!(
            phase = "turn",
            event = "turn_success",
            session_id = %result.session_id,
            trace_id = %result.trace_id,
            function_rounds = result.function_rounds,
            round_limit_reached = result.round_limit_reached,
            delivered = result.delivery.delivered,
            total_tokens = result.usage.total_tokens,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_turn_failure(
        &self,
        session_id: &SessionId,
        trace_id: &TraceId,
        error: &ChatError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "turn",
            event = "turn_failure",
            session_id = %session_id,
            trace_id = %trace_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}
