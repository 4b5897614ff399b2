//! Common `cprovider` imports for downstream crates.

pub use crate::{
    FunctionArguments, FunctionCall, FunctionDefinition, Message, ModelProvider, ModelRequest,
    ModelRequestBuilder, ModelResponse, NoopOperationHooks, OutputItem, ProviderError,
    ProviderErrorKind, ProviderFuture, ProviderId, ProviderOperationHooks, RetryPolicy, Role,
    StopReason, TokenUsage, execute_with_retry,
};
pub use ccommon::{BoxFuture, MetadataMap};
