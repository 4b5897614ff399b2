//! Metrics-based observability hooks for provider dispatch, function
//! execution, and chat turns.
//!
//! ```rust
//! use cobserve::MetricsObservabilityHooks;
//! use cprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::Duration;

use cchat::{ChatError, ChatTurnHooks, ChatTurnResult};
use ccommon::{SessionId, TraceId};
use cprovider::{ProviderError, ProviderId, ProviderOperationHooks};
use ctooling::{FunctionCallResult, FunctionError, FunctionExecutionContext, FunctionHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: &ProviderId, operation: &str, _attempt: u32) {
        metrics::counter!(
            "confab_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        provider: &ProviderId,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "confab_provider_retry_scheduled_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "confab_provider_retry_delay_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, provider: &ProviderId, operation: &str, attempts: u32) {
        metrics::counter!(
            "confab_provider_success_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "confab_provider_attempts_per_success",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "confab_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "confab_provider_attempts_per_failure",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }
}

impl FunctionHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, name: &str, _context: &FunctionExecutionContext) {
        metrics::counter!(
            "confab_function_execution_start_total",
            "function" => name.to_string()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        name: &str,
        _context: &FunctionExecutionContext,
        result: &FunctionCallResult,
        elapsed: Duration,
    ) {
        let outcome = if result.is_success() { "ok" } else { "reported_failure" };
        metrics::counter!(
            "confab_function_execution_success_total",
            "function" => name.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(
            "confab_function_execution_duration_seconds",
            "function" => name.to_string(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        name: &str,
        _context: &FunctionExecutionContext,
        error: &FunctionError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "confab_function_execution_failure_total",
            "function" => name.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "confab_function_execution_duration_seconds",
            "function" => name.to_string(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl ChatTurnHooks for MetricsObservabilityHooks {
    fn on_turn_start(&self, _session_id: &SessionId, _trace_id: &TraceId) {
        metrics::counter!("confab_chat_turn_start_total").increment(1);
        metrics::gauge!("confab_chat_turns_in_flight").increment(1.0);
    }

    fn on_turn_success(&self, result: &ChatTurnResult, elapsed: Duration) {
        metrics::gauge!("confab_chat_turns_in_flight").decrement(1.0);
        metrics::counter!(
            "confab_chat_turn_success_total",
            "round_limit_reached" => result.round_limit_reached.to_string()
        )
        .increment(1);
        metrics::histogram!("confab_chat_turn_function_rounds")
            .record(result.function_rounds as f64);
        metrics::histogram!(
            "confab_chat_turn_duration_seconds",
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_turn_failure(
        &self,
        _session_id: &SessionId,
        _trace_id: &TraceId,
        error: &ChatError,
        elapsed: Duration,
    ) {
        metrics::gauge!("confab_chat_turns_in_flight").decrement(1.0);
        metrics::counter!(
            "confab_chat_turn_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "confab_chat_turn_duration_seconds",
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}
