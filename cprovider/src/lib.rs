//! Provider contracts for dispatching a conversation to an AI model.
//!
//! The coordinator only depends on [`ModelProvider`]; concrete vendor clients
//! live with the host application and map their wire schema onto
//! [`ModelRequest`] / [`ModelResponse`].

mod error;
mod model;
mod provider;
mod resilience;

pub mod prelude;

pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    FunctionArguments, FunctionCall, FunctionDefinition, Message, ModelRequest,
    ModelRequestBuilder, ModelResponse, OutputItem, ProviderId, Role, StopReason, TokenUsage,
};
pub use provider::{ModelProvider, ProviderFuture};
pub use resilience::{
    NoopOperationHooks, ProviderOperationHooks, RetryPolicy, execute_with_retry,
};
