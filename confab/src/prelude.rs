//! Common imports for most confab hosts.

pub use crate::{
    RuntimeBundle, assistant_message, build_runtime, build_runtime_with, function_definition,
    in_memory_store, observed_functions, orchestrator, parse_session_status, system_message, turn,
    user_message,
};
pub use crate::{cf_args, cf_messages, cf_msg};
pub use crate::{
    BoxFuture, BusinessFunction, ChannelSink, ChatError, ChatErrorKind, ChatMessage,
    ChatOrchestrator, ChatPolicy, ChatSession, ChatTurnOptions, ChatTurnRequest, ChatTurnResult,
    CloseReason, DeliveryEvent, DeliveryOptions, DeliverySink, FunctionArguments,
    FunctionCallResult, FunctionDefinition, FunctionError, FunctionExecutionContext,
    FunctionRegistry, InMemorySessionStore, Message, ModelProvider, ModelRequest, ModelResponse,
    ProviderError, ProviderId, RetryPolicy, Role, SessionId, SessionStatus, SessionStore,
};
