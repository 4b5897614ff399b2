//! One AI turn: dispatch, function-call rounds, and finalization.
//!
//! The coordinator never touches the store. It reads the history it is given,
//! pushes events onto the turn's [`DeliveryHandle`], and returns the final
//! assistant text together with the FUNCTION messages produced along the way.

use std::sync::Arc;

use ccommon::{MessageId, TraceId};
use cprovider::{
    Message, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderOperationHooks,
    Role, TokenUsage, execute_with_retry,
};
use ctooling::{FunctionExecutionContext, FunctionRegistry};

use crate::{
    ChatError, ChatErrorKind, ChatMessage, ChatPolicy, ChatSession, ChatTurnOptions,
    DeliveryEvent, DeliveryHandle,
};

/// Input for one coordinator run. `history` already contains the new user message.
#[derive(Debug, Clone)]
pub struct TurnInput<'a> {
    pub session: &'a ChatSession,
    pub history: Vec<ChatMessage>,
    pub options: ChatTurnOptions,
    pub trace_id: TraceId,
    pub parent_message_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub final_text: String,
    pub function_messages: Vec<ChatMessage>,
    pub function_rounds: u32,
    pub round_limit_reached: bool,
    pub usage: TokenUsage,
}

#[derive(Clone)]
pub struct ConversationCoordinator {
    provider: Arc<dyn ModelProvider>,
    functions: Arc<FunctionRegistry>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    policy: ChatPolicy,
}

impl ConversationCoordinator {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        functions: Arc<FunctionRegistry>,
        provider_hooks: Arc<dyn ProviderOperationHooks>,
        policy: ChatPolicy,
    ) -> Self {
        Self {
            provider,
            functions,
            provider_hooks,
            policy,
        }
    }

    pub fn policy(&self) -> &ChatPolicy {
        &self.policy
    }

    /// Runs the turn. Any failure other than cancellation is also pushed to
    /// `delivery` as a terminal [`DeliveryEvent::Error`].
    pub async fn run(
        &self,
        input: TurnInput<'_>,
        delivery: &DeliveryHandle,
    ) -> Result<TurnOutcome, ChatError> {
        match self.run_rounds(input, delivery).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                if error.kind != ChatErrorKind::Cancelled {
                    delivery.push(DeliveryEvent::Error(error.message.clone()));
                }
                Err(error)
            }
        }
    }

    async fn run_rounds(
        &self,
        input: TurnInput<'_>,
        delivery: &DeliveryHandle,
    ) -> Result<TurnOutcome, ChatError> {
        let TurnInput {
            session,
            history,
            options,
            trace_id,
            parent_message_id,
        } = input;

        delivery.push(DeliveryEvent::Thinking);

        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(system_prompt) = &session.system_prompt {
            messages.push(Message::new(Role::System, system_prompt.clone()));
        }
        messages.extend(history.iter().map(ChatMessage::to_provider_message));

        let definitions = self.functions.all_definitions();
        let context = FunctionExecutionContext::new(session.id.clone()).with_trace_id(trace_id.clone());

        let mut function_messages = Vec::new();
        let mut usage = TokenUsage::default();
        let mut rounds = 0_u32;
        let mut dispatches = 0_u32;

        let (final_text, round_limit_reached) = loop {
            ensure_live(delivery)?;

            let mut builder = ModelRequest::builder(session.model.clone())
                .messages(messages.clone())
                .functions(definitions.clone())
                .metadata("session_id", session.id.as_str())
                .metadata("trace_id", trace_id.as_str());
            if let Some(temperature) = options.temperature {
                builder = builder.temperature(temperature);
            }
            if let Some(max_tokens) = options.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }

            let request = builder
                .build()
                .map_err(|error| ChatError::invalid_request(error.message))?;
            let response = self.dispatch(request, delivery).await?;
            dispatches += 1;
            usage.accumulate(response.usage);

            let calls = response.function_calls();
            if calls.is_empty() {
                break (response.assistant_text(), false);
            }

            // The last allowed dispatch still wants calls; nothing would read their results.
            if dispatches >= self.policy.max_function_rounds {
                tracing::warn!(
                    session_id = %session.id,
                    trace_id = %trace_id,
                    dispatches,
                    dropped_calls = calls.len(),
                    "function round limit reached; finalizing turn"
                );
                break (self.policy.render_degraded_message(), true);
            }
            rounds += 1;

            for call in calls {
                ensure_live(delivery)?;

                delivery.push(DeliveryEvent::FunctionCallRequested {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                });

                let result = self.functions.execute_call(&call, &context).await;

                // The execution was allowed to finish; its result is dropped.
                ensure_live(delivery)?;

                delivery.push(DeliveryEvent::FunctionCallCompleted {
                    name: call.name.clone(),
                    result: result.clone(),
                });

                messages.push(Message::function_result(call.clone(), result.to_wire_string()));
                let message = ChatMessage::function(session.id.clone(), call, &result);
                function_messages.push(match &parent_message_id {
                    Some(parent) => message.with_parent(parent.clone()),
                    None => message,
                });
            }
        };

        for token in tokenize(&final_text) {
            delivery.push(DeliveryEvent::TokenChunk(token.to_string()));
        }
        delivery.push(DeliveryEvent::Completed(final_text.clone()));

        Ok(TurnOutcome {
            final_text,
            function_messages,
            function_rounds: rounds,
            round_limit_reached,
            usage,
        })
    }

    /// One provider round-trip with retry, a per-attempt timeout, and
    /// cancellation.
    async fn dispatch(
        &self,
        request: ModelRequest,
        delivery: &DeliveryHandle,
    ) -> Result<ModelResponse, ChatError> {
        let provider_id = self.provider.id();
        let timeout = self.policy.dispatch_timeout;
        let cancellation = delivery.cancellation();

        let attempts = execute_with_retry(
            &provider_id,
            "complete",
            &self.policy.retry,
            self.provider_hooks.as_ref(),
            |_attempt| {
                let provider = Arc::clone(&self.provider);
                let request = request.clone();
                async move {
                    match tokio::time::timeout(timeout, provider.complete(request)).await {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::timeout(format!(
                            "provider did not answer within {}ms",
                            timeout.as_millis()
                        ))),
                    }
                }
            },
            tokio::time::sleep,
        );

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(ChatError::cancelled("turn cancelled while waiting for the provider")),
            result = attempts => result.map_err(|error| ChatError::from(error.with_provider(provider_id.clone()))),
        }
    }
}

fn ensure_live(delivery: &DeliveryHandle) -> Result<(), ChatError> {
    if delivery.is_cancelled() {
        Err(ChatError::cancelled("client disconnected"))
    } else {
        Ok(())
    }
}

/// Splits `text` into whitespace-delimited tokens, each keeping its trailing
/// whitespace so the concatenation reproduces `text`.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_whitespace = false;

    for (index, character) in text.char_indices() {
        if character.is_whitespace() {
            in_whitespace = true;
        } else if in_whitespace {
            tokens.push(&text[start..index]);
            start = index;
            in_whitespace = false;
        }
    }

    if start < text.len() {
        tokens.push(&text[start..]);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_keeps_whitespace_attached() {
        assert_eq!(tokenize("hello brave  world"), vec!["hello ", "brave  ", "world"]);
        assert_eq!(tokenize("done"), vec!["done"]);
        assert_eq!(tokenize("  leading"), vec!["  ", "leading"]);
        assert!(tokenize("").is_empty());
        assert_eq!(tokenize("a b ").concat(), "a b ");
    }
}
