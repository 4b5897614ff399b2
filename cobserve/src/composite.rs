//! Tracing and metrics observers combined behind a single hook value.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cchat::ChatTurnHooks;
//! use cobserve::CompositeHooks;
//! use cprovider::ProviderOperationHooks;
//!
//! let hooks = Arc::new(CompositeHooks::new());
//! let _turns: Arc<dyn ChatTurnHooks> = hooks.clone();
//! let _provider: Arc<dyn ProviderOperationHooks> = hooks;
//! ```

use std::time::Duration;

use cchat::{ChatError, ChatTurnHooks, ChatTurnResult};
use ccommon::{SessionId, TraceId};
use cprovider::{ProviderError, ProviderId, ProviderOperationHooks};
use ctooling::{FunctionCallResult, FunctionError, FunctionExecutionContext, FunctionHooks};

use crate::{MetricsObservabilityHooks, TracingObservabilityHooks};

/// Forwards every callback to the tracing observer, then the metrics one.
#[derive(Debug, Clone, Copy)]
pub struct CompositeHooks {
    tracing: TracingObservabilityHooks,
    metrics: MetricsObservabilityHooks,
}

impl CompositeHooks {
    pub fn new() -> Self {
        Self {
            tracing: TracingObservabilityHooks,
            metrics: MetricsObservabilityHooks,
        }
    }
}

impl Default for CompositeHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderOperationHooks for CompositeHooks {
    fn on_attempt_start(&self, provider: &ProviderId, operation: &str, attempt: u32) {
        self.tracing.on_attempt_start(provider, operation, attempt);
        self.metrics.on_attempt_start(provider, operation, attempt);
    }

    fn on_retry_scheduled(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        self.tracing
            .on_retry_scheduled(provider, operation, attempt, delay, error);
        self.metrics
            .on_retry_scheduled(provider, operation, attempt, delay, error);
    }

    fn on_success(&self, provider: &ProviderId, operation: &str, attempts: u32) {
        self.tracing.on_success(provider, operation, attempts);
        self.metrics.on_success(provider, operation, attempts);
    }

    fn on_failure(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        self.tracing.on_failure(provider, operation, attempts, error);
        self.metrics.on_failure(provider, operation, attempts, error);
    }
}

impl FunctionHooks for CompositeHooks {
    fn on_execution_start(&self, name: &str, context: &FunctionExecutionContext) {
        self.tracing.on_execution_start(name, context);
        self.metrics.on_execution_start(name, context);
    }

    fn on_execution_success(
        &self,
        name: &str,
        context: &FunctionExecutionContext,
        result: &FunctionCallResult,
        elapsed: Duration,
    ) {
        self.tracing
            .on_execution_success(name, context, result, elapsed);
        self.metrics
            .on_execution_success(name, context, result, elapsed);
    }

    fn on_execution_failure(
        &self,
        name: &str,
        context: &FunctionExecutionContext,
        error: &FunctionError,
        elapsed: Duration,
    ) {
        self.tracing
            .on_execution_failure(name, context, error, elapsed);
        self.metrics
            .on_execution_failure(name, context, error, elapsed);
    }
}

impl ChatTurnHooks for CompositeHooks {
    fn on_turn_start(&self, session_id: &SessionId, trace_id: &TraceId) {
        self.tracing.on_turn_start(session_id, trace_id);
        self.metrics.on_turn_start(session_id, trace_id);
    }

    fn on_turn_success(&self, result: &ChatTurnResult, elapsed: Duration) {
        self.tracing.on_turn_success(result, elapsed);
        self.metrics.on_turn_success(result, elapsed);
    }

    fn on_turn_failure(
        &self,
        session_id: &SessionId,
        trace_id: &TraceId,
        error: &ChatError,
        elapsed: Duration,
    ) {
        self.tracing
            .on_turn_failure(session_id, trace_id, error, elapsed);
        self.metrics
            .on_turn_failure(session_id, trace_id, error, elapsed);
    }
}
