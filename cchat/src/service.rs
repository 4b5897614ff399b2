//! Chat orchestrator: session gatekeeping, persistence, and turn wiring.
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use std::sync::Arc;
//!
//! use cchat::{ChannelSink, ChatOrchestrator, ChatTurnRequest, DeliveryOptions};
//! use cprovider::{
//!     Message, ModelProvider, ModelRequest, ModelResponse, OutputItem, ProviderError,
//!     ProviderFuture, ProviderId, Role, StopReason, TokenUsage,
//! };
//!
//! struct Parrot;
//!
//! impl ModelProvider for Parrot {
//!     fn id(&self) -> ProviderId {
//!         ProviderId::from("parrot")
//!     }
//!
//!     fn complete<'a>(
//!         &'a self,
//!         request: ModelRequest,
//!     ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
//!         Box::pin(async move {
//!             let last = request.messages.last().map(|m| m.text().to_string()).unwrap_or_default();
//!             Ok(ModelResponse {
//!                 provider: ProviderId::from("parrot"),
//!                 model: request.model,
//!                 output: vec![OutputItem::Message(Message::new(Role::Assistant, last))],
//!                 stop_reason: StopReason::EndTurn,
//!                 usage: TokenUsage::default(),
//!             })
//!         })
//!     }
//! }
//!
//! let orchestrator = ChatOrchestrator::builder(Arc::new(Parrot))
//!     .build()
//!     .expect("default policy is valid");
//! let session = orchestrator.create_session("user-1", "parrot-1").await.expect("session");
//!
//! let (sink, _events) = ChannelSink::new(64);
//! let request = ChatTurnRequest::new(session.id.clone(), "hello there")
//!     .with_delivery_options(DeliveryOptions::default().with_typing_delay(Default::default()));
//! let result = orchestrator.run_turn(request, sink).await.expect("turn");
//!
//! assert_eq!(result.assistant_message.text(), "hello there");
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use ccommon::{Registry, SessionId, TraceId};
use chrono::Utc;
use cprovider::{ModelProvider, NoopOperationHooks, ProviderOperationHooks, RetryPolicy};
use ctooling::FunctionRegistry;
use tokio::task::JoinHandle;

use crate::{
    ChatError, ChatErrorKind, ChatMessage, ChatSession, ChatTurnHooks, ChatTurnRequest,
    ChatTurnResult, CloseReason, ConversationCoordinator, DeliveryEvent, DeliveryHandle,
    DeliveryOptions, DeliverySink, InMemorySessionStore, NoopChatTurnHooks, SessionStatus,
    SessionStore, StreamingDelivery, TurnInput,
};

const MAX_ROUNDS_PLACEHOLDER: &str = "{max_rounds}";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatPolicy {
    /// Provider dispatches allowed per turn. A turn therefore runs at most
    /// `max_function_rounds - 1` rounds of function execution.
    pub max_function_rounds: u32,
    /// Bound on each provider attempt.
    pub dispatch_timeout: Duration,
    pub retry: RetryPolicy,
    /// Final text when the round limit is hit; `{max_rounds}` is substituted.
    pub degraded_message: String,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            max_function_rounds: 5,
            dispatch_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            degraded_message: "I could not finish this request within {max_rounds} model calls. Please narrow it down and try again.".to_string(),
        }
    }
}

impl ChatPolicy {
    pub fn with_max_function_rounds(mut self, max_function_rounds: u32) -> Self {
        self.max_function_rounds = max_function_rounds;
        self
    }

    pub fn with_dispatch_timeout(mut self, dispatch_timeout: Duration) -> Self {
        self.dispatch_timeout = dispatch_timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_degraded_message(mut self, degraded_message: impl Into<String>) -> Self {
        self.degraded_message = degraded_message.into();
        self
    }

    pub fn render_degraded_message(&self) -> String {
        self.degraded_message
            .replace(MAX_ROUNDS_PLACEHOLDER, &self.max_function_rounds.to_string())
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.max_function_rounds == 0 {
            return Err(ChatError::invalid_request(
                "max_function_rounds must be at least 1",
            ));
        }

        if self.dispatch_timeout.is_zero() {
            return Err(ChatError::invalid_request(
                "dispatch_timeout must be greater than zero",
            ));
        }

        if self.degraded_message.trim().is_empty() {
            return Err(ChatError::invalid_request(
                "degraded_message must not be empty",
            ));
        }

        self.retry
            .validate()
            .map_err(|error| ChatError::invalid_request(error.message))
    }
}

/// Entry point for hosts: owns the store, the coordinator, and the set of
/// sessions with a turn in flight.
#[derive(Clone)]
pub struct ChatOrchestrator {
    store: Arc<dyn SessionStore>,
    functions: Arc<FunctionRegistry>,
    coordinator: Arc<ConversationCoordinator>,
    delivery: StreamingDelivery,
    hooks: Arc<dyn ChatTurnHooks>,
    default_system_prompt: Option<String>,
    active_turns: Arc<Registry<SessionId, TraceId>>,
}

impl ChatOrchestrator {
    pub fn builder(provider: Arc<dyn ModelProvider>) -> ChatOrchestratorBuilder {
        ChatOrchestratorBuilder::new(provider)
    }

    pub fn functions(&self) -> Arc<FunctionRegistry> {
        Arc::clone(&self.functions)
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.store)
    }

    pub fn policy(&self) -> &ChatPolicy {
        self.coordinator.policy()
    }

    pub fn is_turn_active(&self, session_id: &SessionId) -> bool {
        self.active_turns.contains_key(session_id)
    }

    /// Creates and persists a new ACTIVE session.
    pub async fn create_session(
        &self,
        user_id: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<ChatSession, ChatError> {
        let mut session = ChatSession::new(user_id, model);
        if let Some(system_prompt) = &self.default_system_prompt {
            session = session.with_system_prompt(system_prompt.clone());
        }

        self.store.save_session(session.clone()).await?;
        tracing::info!(session_id = %session.id, user_id = %session.user_id, "session created");
        Ok(session)
    }

    pub async fn session(&self, session_id: &SessionId) -> Result<ChatSession, ChatError> {
        self.store
            .find_session(session_id)
            .await?
            .ok_or_else(|| ChatError::session_not_found(session_id))
    }

    pub async fn change_status(
        &self,
        session_id: &SessionId,
        next: SessionStatus,
    ) -> Result<ChatSession, ChatError> {
        let mut session = self.session(session_id).await?;
        let previous = session.status;
        session.transition_to(next)?;
        self.store.save_session(session.clone()).await?;

        tracing::info!(
            session_id = %session.id,
            from = %previous,
            to = %next,
            "session status changed"
        );
        Ok(session)
    }

    pub async fn history(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>, ChatError> {
        self.session(session_id).await?;
        self.store.find_messages(session_id).await
    }

    /// Runs one turn to completion, streaming events into `sink`.
    ///
    /// Session and request errors are returned before the sink is opened.
    /// Once the sink is open it is closed exactly once, whatever the outcome.
    pub async fn run_turn<S>(
        &self,
        request: ChatTurnRequest,
        sink: S,
    ) -> Result<ChatTurnResult, ChatError>
    where
        S: DeliverySink + 'static,
    {
        let started = Instant::now();
        let session_id = request.session_id.clone();
        let trace_id = request.trace_id.clone().unwrap_or_else(TraceId::generate);
        self.hooks.on_turn_start(&session_id, &trace_id);

        let result = self.execute_turn(request, sink, trace_id.clone()).await;
        match &result {
            Ok(turn) => self.hooks.on_turn_success(turn, started.elapsed()),
            Err(error) => {
                self.hooks
                    .on_turn_failure(&session_id, &trace_id, error, started.elapsed())
            }
        }

        result
    }

    /// Same as [`ChatOrchestrator::run_turn`] on its own task.
    pub fn spawn_turn<S>(
        &self,
        request: ChatTurnRequest,
        sink: S,
    ) -> JoinHandle<Result<ChatTurnResult, ChatError>>
    where
        S: DeliverySink + 'static,
    {
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.run_turn(request, sink).await })
    }

    async fn execute_turn<S>(
        &self,
        request: ChatTurnRequest,
        sink: S,
        trace_id: TraceId,
    ) -> Result<ChatTurnResult, ChatError>
    where
        S: DeliverySink + 'static,
    {
        let session = self.session(&request.session_id).await?;
        session.ensure_interactive()?;
        let _guard = TurnGuard::acquire(&self.active_turns, &session.id, &trace_id)?;
        request.validate()?;

        let delivery = match request.delivery {
            Some(options) => StreamingDelivery::new(options),
            None => self.delivery,
        }
        .open(sink);

        match self
            .drive(&session, request, &delivery, trace_id)
            .await
        {
            Ok(mut result) => {
                result.delivery = delivery.close(CloseReason::Completed).await;
                Ok(result)
            }
            Err(error) => {
                let reason = if error.kind == ChatErrorKind::Cancelled {
                    CloseReason::Cancelled
                } else {
                    CloseReason::Failed
                };
                let report = delivery.close(reason).await;
                tracing::warn!(
                    session_id = %session.id,
                    error = %error,
                    close_reason = %report.close_reason,
                    "turn failed"
                );
                Err(error)
            }
        }
    }

    async fn drive(
        &self,
        session: &ChatSession,
        request: ChatTurnRequest,
        delivery: &DeliveryHandle,
        trace_id: TraceId,
    ) -> Result<ChatTurnResult, ChatError> {
        let user_message = ChatMessage::user(session.id.clone(), request.user_input);
        self.store
            .save_message(user_message.clone())
            .await
            .inspect_err(|error| report_store_error(delivery, error))?;

        let history = self
            .store
            .find_messages(&session.id)
            .await
            .inspect_err(|error| report_store_error(delivery, error))?;

        let outcome = self
            .coordinator
            .run(
                TurnInput {
                    session,
                    history,
                    options: request.options,
                    trace_id: trace_id.clone(),
                    parent_message_id: Some(user_message.id.clone()),
                },
                delivery,
            )
            .await?;

        let assistant_message = ChatMessage::assistant(session.id.clone(), outcome.final_text)
            .with_parent(user_message.id.clone());

        let mut replies = outcome.function_messages.clone();
        replies.push(assistant_message.clone());
        self.store
            .save_messages(replies)
            .await
            .inspect_err(|error| report_store_error(delivery, error))?;

        // Status may have changed while the turn ran; only the timestamp is ours to write.
        self.store
            .touch_session(&session.id, Utc::now())
            .await
            .inspect_err(|error| report_store_error(delivery, error))?;

        Ok(ChatTurnResult {
            session_id: session.id.clone(),
            trace_id,
            user_message,
            assistant_message,
            function_messages: outcome.function_messages,
            function_rounds: outcome.function_rounds,
            round_limit_reached: outcome.round_limit_reached,
            usage: outcome.usage,
            delivery: Default::default(),
        })
    }
}

fn report_store_error(delivery: &DeliveryHandle, error: &ChatError) {
    delivery.push(DeliveryEvent::Error(error.message.clone()));
}

/// Marks a session as busy for the lifetime of one turn.
struct TurnGuard {
    active_turns: Arc<Registry<SessionId, TraceId>>,
    session_id: SessionId,
}

impl TurnGuard {
    fn acquire(
        active_turns: &Arc<Registry<SessionId, TraceId>>,
        session_id: &SessionId,
        trace_id: &TraceId,
    ) -> Result<Self, ChatError> {
        if !active_turns.try_insert(session_id.clone(), trace_id.clone()) {
            return Err(ChatError::turn_in_progress(session_id));
        }

        Ok(Self {
            active_turns: Arc::clone(active_turns),
            session_id: session_id.clone(),
        })
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.active_turns.remove(&self.session_id);
    }
}

pub struct ChatOrchestratorBuilder {
    provider: Arc<dyn ModelProvider>,
    store: Option<Arc<dyn SessionStore>>,
    functions: Option<Arc<FunctionRegistry>>,
    policy: ChatPolicy,
    delivery_options: DeliveryOptions,
    turn_hooks: Arc<dyn ChatTurnHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    default_system_prompt: Option<String>,
}

impl ChatOrchestratorBuilder {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            store: None,
            functions: None,
            policy: ChatPolicy::default(),
            delivery_options: DeliveryOptions::default(),
            turn_hooks: Arc::new(NoopChatTurnHooks),
            provider_hooks: Arc::new(NoopOperationHooks),
            default_system_prompt: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = Some(functions);
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_function_rounds(mut self, max_function_rounds: u32) -> Self {
        self.policy.max_function_rounds = max_function_rounds;
        self
    }

    pub fn dispatch_timeout(mut self, dispatch_timeout: Duration) -> Self {
        self.policy.dispatch_timeout = dispatch_timeout;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.policy.retry = retry;
        self
    }

    pub fn delivery_options(mut self, delivery_options: DeliveryOptions) -> Self {
        self.delivery_options = delivery_options;
        self
    }

    pub fn turn_hooks(mut self, turn_hooks: Arc<dyn ChatTurnHooks>) -> Self {
        self.turn_hooks = turn_hooks;
        self
    }

    pub fn provider_hooks(mut self, provider_hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = provider_hooks;
        self
    }

    pub fn default_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.default_system_prompt = Some(system_prompt.into());
        self
    }

    pub fn build(self) -> Result<ChatOrchestrator, ChatError> {
        self.policy.validate()?;

        let functions = self
            .functions
            .unwrap_or_else(|| Arc::new(FunctionRegistry::new()));
        let coordinator = ConversationCoordinator::new(
            self.provider,
            Arc::clone(&functions),
            self.provider_hooks,
            self.policy,
        );

        Ok(ChatOrchestrator {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemorySessionStore::new())),
            functions,
            coordinator: Arc::new(coordinator),
            delivery: StreamingDelivery::new(self.delivery_options),
            hooks: self.turn_hooks,
            default_system_prompt: self.default_system_prompt,
            active_turns: Arc::new(Registry::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use cprovider::{
        Message, ModelRequest, ModelResponse, OutputItem, ProviderError, ProviderFuture,
        ProviderId, Role, StopReason, TokenUsage,
    };

    use super::*;

    struct StaticProvider;

    impl ModelProvider for StaticProvider {
        fn id(&self) -> ProviderId {
            ProviderId::from("static")
        }

        fn complete<'a>(
            &'a self,
            request: ModelRequest,
        ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
            Box::pin(async move {
                Ok(ModelResponse {
                    provider: ProviderId::from("static"),
                    model: request.model,
                    output: vec![OutputItem::Message(Message::new(Role::Assistant, "ok"))],
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                })
            })
        }
    }

    #[test]
    fn policy_defaults_and_degraded_message() {
        let policy = ChatPolicy::default();
        assert_eq!(policy.max_function_rounds, 5);
        assert_eq!(policy.dispatch_timeout, Duration::from_secs(60));
        assert_eq!(policy.retry.max_attempts, 3);
        assert!(policy.render_degraded_message().contains("within 5 model calls"));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn builder_rejects_invalid_policy() {
        let result = ChatOrchestrator::builder(Arc::new(StaticProvider))
            .dispatch_timeout(Duration::ZERO)
            .build();
        let error = result.err().expect("zero timeout must fail");
        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);

        let error = ChatOrchestrator::builder(Arc::new(StaticProvider))
            .max_function_rounds(0)
            .build()
            .err()
            .expect("a turn needs at least one dispatch");
        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
    }

    #[test]
    fn turn_guard_is_exclusive_and_released_on_drop() {
        let active = Arc::new(Registry::new());
        let session = SessionId::from("s1");
        let trace = TraceId::from("t1");

        let guard = TurnGuard::acquire(&active, &session, &trace).expect("first acquire");
        let error = TurnGuard::acquire(&active, &session, &trace)
            .err()
            .expect("second acquire must fail");
        assert_eq!(error.kind, ChatErrorKind::TurnInProgress);

        drop(guard);
        assert!(TurnGuard::acquire(&active, &session, &trace).is_ok());
    }

    #[tokio::test]
    async fn change_status_persists_and_rejects_illegal_moves() {
        let orchestrator = ChatOrchestrator::builder(Arc::new(StaticProvider))
            .build()
            .expect("orchestrator should build");
        let session = orchestrator
            .create_session("user-1", "static-1")
            .await
            .expect("session should be created");

        let paused = orchestrator
            .change_status(&session.id, SessionStatus::Paused)
            .await
            .expect("active can pause");
        assert_eq!(paused.status, SessionStatus::Paused);

        let error = orchestrator
            .change_status(&session.id, SessionStatus::Completed)
            .await
            .expect_err("paused cannot complete");
        assert_eq!(error.kind, ChatErrorKind::IllegalTransition);

        let stored = orchestrator.session(&session.id).await.expect("session");
        assert_eq!(stored.status, SessionStatus::Paused);
    }

    #[tokio::test]
    async fn unknown_session_is_reported() {
        let orchestrator = ChatOrchestrator::builder(Arc::new(StaticProvider))
            .build()
            .expect("orchestrator should build");
        let error = orchestrator
            .history(&SessionId::from("ghost"))
            .await
            .expect_err("unknown session");
        assert_eq!(error.kind, ChatErrorKind::SessionNotFound);
    }
}
