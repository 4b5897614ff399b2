use std::sync::{Arc, Mutex};
use std::time::Duration;

use cchat::{
    ChatError, ChatMessage, ChatTurnHooks, ChatTurnResult, DeliveryReport, SessionId, TraceId,
};
use cprovider::{ProviderError, ProviderId, ProviderOperationHooks, TokenUsage};
use ctooling::{FunctionCallResult, FunctionError, FunctionExecutionContext, FunctionHooks};
use serde_json::json;

use crate::{
    CompositeHooks, MetricsObservabilityHooks, SafeChatTurnHooks, SafeFunctionHooks,
    SafeProviderHooks, TracingObservabilityHooks,
};

fn provider() -> ProviderId {
    ProviderId::from("openai")
}

fn sample_context() -> FunctionExecutionContext {
    FunctionExecutionContext::new("session-1")
        .with_trace_id("trace-1")
        .with_call_id("call-1")
}

fn sample_turn_result() -> ChatTurnResult {
    let session_id = SessionId::from("session-1");
    ChatTurnResult {
        session_id: session_id.clone(),
        trace_id: TraceId::from("trace-1"),
        user_message: ChatMessage::user(session_id.clone(), "hi"),
        assistant_message: ChatMessage::assistant(session_id, "hello"),
        function_messages: Vec::new(),
        function_rounds: 0,
        round_limit_reached: false,
        usage: TokenUsage::default(),
        delivery: DeliveryReport::default(),
    }
}

fn exercise_provider_hooks(hooks: &dyn ProviderOperationHooks) {
    let provider_error = ProviderError::timeout("provider timeout");

    hooks.on_attempt_start(&provider(), "complete", 1);
    hooks.on_retry_scheduled(
        &provider(),
        "complete",
        1,
        Duration::from_millis(10),
        &provider_error,
    );
    hooks.on_success(&provider(), "complete", 2);
    hooks.on_failure(&provider(), "complete", 2, &provider_error);
}

fn exercise_function_hooks(hooks: &dyn FunctionHooks) {
    hooks.on_execution_start("echo", &sample_context());
    hooks.on_execution_success(
        "echo",
        &sample_context(),
        &FunctionCallResult::ok(json!({"echo": "hi"})),
        Duration::from_millis(20),
    );
    hooks.on_execution_failure(
        "echo",
        &sample_context(),
        &FunctionError::execution("function failed"),
        Duration::from_millis(20),
    );
}

fn exercise_turn_hooks(hooks: &dyn ChatTurnHooks) {
    let session_id = SessionId::from("session-1");
    let trace_id = TraceId::from("trace-1");

    hooks.on_turn_start(&session_id, &trace_id);
    hooks.on_turn_success(&sample_turn_result(), Duration::from_millis(30));
    hooks.on_turn_failure(
        &session_id,
        &trace_id,
        &ChatError::provider("provider down"),
        Duration::from_millis(30),
    );
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    let hooks = TracingObservabilityHooks;
    exercise_provider_hooks(&hooks);
    exercise_function_hooks(&hooks);
    exercise_turn_hooks(&hooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    let hooks = MetricsObservabilityHooks;
    exercise_provider_hooks(&hooks);
    exercise_function_hooks(&hooks);
    exercise_turn_hooks(&hooks);
}

#[test]
fn composite_hooks_smoke_test_all_callbacks() {
    let hooks = CompositeHooks::new();
    exercise_provider_hooks(&hooks);
    exercise_function_hooks(&hooks);
    exercise_turn_hooks(&hooks);
}

#[derive(Default, Clone)]
struct RecordingHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHooks {
    fn record(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl ProviderOperationHooks for RecordingHooks {
    fn on_attempt_start(&self, _provider: &ProviderId, _operation: &str, _attempt: u32) {
        self.record("attempt_start");
    }

    fn on_retry_scheduled(
        &self,
        _provider: &ProviderId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
        self.record("retry_scheduled");
    }

    fn on_success(&self, _provider: &ProviderId, _operation: &str, _attempts: u32) {
        self.record("success");
    }

    fn on_failure(
        &self,
        _provider: &ProviderId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
        self.record("failure");
    }
}

impl FunctionHooks for RecordingHooks {
    fn on_execution_start(&self, _name: &str, _context: &FunctionExecutionContext) {
        self.record("start");
    }

    fn on_execution_success(
        &self,
        _name: &str,
        _context: &FunctionExecutionContext,
        _result: &FunctionCallResult,
        _elapsed: Duration,
    ) {
        self.record("success");
    }

    fn on_execution_failure(
        &self,
        _name: &str,
        _context: &FunctionExecutionContext,
        _error: &FunctionError,
        _elapsed: Duration,
    ) {
        self.record("failure");
    }
}

impl ChatTurnHooks for RecordingHooks {
    fn on_turn_start(&self, _session_id: &SessionId, _trace_id: &TraceId) {
        self.record("turn_start");
    }

    fn on_turn_success(&self, _result: &ChatTurnResult, _elapsed: Duration) {
        self.record("turn_success");
    }

    fn on_turn_failure(
        &self,
        _session_id: &SessionId,
        _trace_id: &TraceId,
        _error: &ChatError,
        _elapsed: Duration,
    ) {
        self.record("turn_failure");
    }
}

struct PanicHooks;

impl ProviderOperationHooks for PanicHooks {
    fn on_attempt_start(&self, _provider: &ProviderId, _operation: &str, _attempt: u32) {
        panic!("attempt_start panic");
    }

    fn on_retry_scheduled(
        &self,
        _provider: &ProviderId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
        panic!("retry_scheduled panic");
    }

    fn on_success(&self, _provider: &ProviderId, _operation: &str, _attempts: u32) {
        panic!("success panic");
    }

    fn on_failure(
        &self,
        _provider: &ProviderId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
        panic!("failure panic");
    }
}

impl FunctionHooks for PanicHooks {
    fn on_execution_start(&self, _name: &str, _context: &FunctionExecutionContext) {
        panic!("start panic");
    }

    fn on_execution_success(
        &self,
        _name: &str,
        _context: &FunctionExecutionContext,
        _result: &FunctionCallResult,
        _elapsed: Duration,
    ) {
        panic!("success panic");
    }

    fn on_execution_failure(
        &self,
        _name: &str,
        _context: &FunctionExecutionContext,
        _error: &FunctionError,
        _elapsed: Duration,
    ) {
        panic!("failure panic");
    }
}

impl ChatTurnHooks for PanicHooks {
    fn on_turn_start(&self, _session_id: &SessionId, _trace_id: &TraceId) {
        panic!("turn_start panic");
    }

    fn on_turn_success(&self, _result: &ChatTurnResult, _elapsed: Duration) {
        panic!("turn_success panic");
    }

    fn on_turn_failure(
        &self,
        _session_id: &SessionId,
        _trace_id: &TraceId,
        _error: &ChatError,
        _elapsed: Duration,
    ) {
        panic!("turn_failure panic");
    }
}

#[test]
fn safe_provider_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);
    exercise_provider_hooks(&SafeProviderHooks::new(inner));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec!["attempt_start", "retry_scheduled", "success", "failure"]
    );
}

#[test]
fn safe_function_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);
    exercise_function_hooks(&SafeFunctionHooks::new(inner));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec!["start", "success", "failure"]
    );
}

#[test]
fn safe_turn_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);
    exercise_turn_hooks(&SafeChatTurnHooks::new(inner));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec!["turn_start", "turn_success", "turn_failure"]
    );
}

#[test]
fn safe_hooks_swallow_panics() {
    exercise_provider_hooks(&SafeProviderHooks::new(PanicHooks));
    exercise_function_hooks(&SafeFunctionHooks::new(PanicHooks));
    exercise_turn_hooks(&SafeChatTurnHooks::new(PanicHooks));
}
