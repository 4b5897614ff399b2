//! Model provider contract used by the conversation coordinator.
//!
//! A provider answers one dispatch with either assistant text or one or more
//! function-call requests. Streaming to the client is handled downstream by the
//! delivery layer, so providers only implement a single completion round-trip.

use ccommon::BoxFuture;

use crate::{ModelRequest, ModelResponse, ProviderError, ProviderId};

pub type ProviderFuture<'a, T> = BoxFuture<'a, T>;

pub trait ModelProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>>;
}
