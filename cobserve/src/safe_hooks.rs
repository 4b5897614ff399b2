use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use cchat::{ChatError, ChatTurnHooks, ChatTurnResult};
use ccommon::{SessionId, TraceId};
use cprovider::{ProviderError, ProviderId, ProviderOperationHooks};
use ctooling::{FunctionCallResult, FunctionError, FunctionExecutionContext, FunctionHooks};

/// Wraps provider hooks so a panicking observer cannot fail a dispatch.
pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: &ProviderId, operation: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(provider, operation, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        }));
    }

    fn on_success(&self, provider: &ProviderId, operation: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, operation, attempts)
        }));
    }

    fn on_failure(
        &self,
        provider: &ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(provider, operation, attempts, error)
        }));
    }
}

pub struct SafeFunctionHooks<H> {
    inner: H,
}

impl<H> SafeFunctionHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> FunctionHooks for SafeFunctionHooks<H>
where
    H: FunctionHooks,
{
    fn on_execution_start(&self, name: &str, context: &FunctionExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_execution_start(name, context)
        }));
    }

    fn on_execution_success(
        &self,
        name: &str,
        context: &FunctionExecutionContext,
        result: &FunctionCallResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_success(name, context, result, elapsed)
        }));
    }

    fn on_execution_failure(
        &self,
        name: &str,
        context: &FunctionExecutionContext,
        error: &FunctionError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_failure(name, context, error, elapsed)
        }));
    }
}

pub struct SafeChatTurnHooks<H> {
    inner: H,
}

impl<H> SafeChatTurnHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ChatTurnHooks for SafeChatTurnHooks<H>
where
    H: ChatTurnHooks,
{
    fn on_turn_start(&self, session_id: &SessionId, trace_id: &TraceId) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_start(session_id, trace_id)
        }));
    }

    fn on_turn_success(&self, result: &ChatTurnResult, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_success(result, elapsed)
        }));
    }

    fn on_turn_failure(
        &self,
        session_id: &SessionId,
        trace_id: &TraceId,
        error: &ChatError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_turn_failure(session_id, trace_id, error, elapsed)
        }));
    }
}
