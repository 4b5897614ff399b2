//! Unified facade over the confab workspace crates.
//!
//! This crate is designed to be the single dependency for most hosts.
//! It re-exports the core confab crates and provides convenience utilities,
//! macros, and runtime wiring with observability attached.

mod macros;

pub mod prelude;
pub mod runtime;
pub mod util;

pub use cchat;
pub use ccommon;
pub use cobserve;
pub use cprovider;
pub use ctooling;

#[doc(hidden)]
pub use serde_json as __serde_json;

pub use cchat::{
    ChannelSink, ChatError, ChatErrorKind, ChatFuture, ChatMessage, ChatOrchestrator,
    ChatOrchestratorBuilder, ChatPolicy, ChatSession, ChatTurnHooks, ChatTurnOptions,
    ChatTurnRequest, ChatTurnResult, CloseReason, ConversationCoordinator, DeliveryError,
    DeliveryErrorKind, DeliveryEvent, DeliveryEventStream, DeliveryHandle, DeliveryOptions,
    DeliveryReport, DeliverySink, InMemorySessionStore, NoopChatTurnHooks, SessionStatus,
    SessionStore, StreamingDelivery,
};
pub use ccommon::{BoxFuture, MessageId, MetadataMap, SessionId, TraceId};
pub use cobserve::{
    CompositeHooks, MetricsObservabilityHooks, SafeChatTurnHooks, SafeFunctionHooks,
    SafeProviderHooks, TracingObservabilityHooks,
};
pub use cprovider::{
    FunctionArguments, FunctionCall, FunctionDefinition, Message, ModelProvider, ModelRequest,
    ModelRequestBuilder, ModelResponse, NoopOperationHooks, OutputItem, ProviderError,
    ProviderErrorKind, ProviderFuture, ProviderId, ProviderOperationHooks, RetryPolicy, Role,
    StopReason, TokenUsage, execute_with_retry,
};
pub use ctooling::{
    BusinessFunction, FunctionCallResult, FunctionError, FunctionErrorKind,
    FunctionExecutionContext, FunctionFuture, FunctionHandler, FunctionHooks, FunctionRegistry,
    NoopFunctionHooks, optional_string, parse_arguments, parse_json_object, required_string,
};

pub use runtime::{
    RuntimeBundle, build_runtime, build_runtime_with, in_memory_store, observed_functions,
    orchestrator,
};
pub use util::{
    assistant_message, function_definition, parse_session_status, system_message, turn,
    user_message,
};

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::Role;

    #[test]
    fn cf_msg_macro_creates_expected_message() {
        let message = crate::cf_msg!(user => "hello");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.text(), "hello");
    }

    #[test]
    fn cf_messages_macro_builds_message_vector() {
        let messages = crate::cf_messages![
            system => "You are concise.",
            user => "Create an entity named Acme",
        ];

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn cf_args_macro_builds_argument_map() {
        let arguments = crate::cf_args! {
            "name" => "Acme",
            "employees" => 12,
        };

        assert_eq!(arguments.len(), 2);
        assert_eq!(arguments.get("name"), Some(&json!("Acme")));
        assert_eq!(arguments.get("employees"), Some(&json!(12)));
        assert!(crate::cf_args!().is_empty());
    }
}
