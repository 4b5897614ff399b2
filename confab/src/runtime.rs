//! Runtime wiring helpers: an orchestrator with tracing and metrics hooks
//! attached to every layer.

use std::sync::Arc;

use crate::{
    ChatError, ChatOrchestrator, ChatPolicy, CompositeHooks, FunctionRegistry,
    InMemorySessionStore, ModelProvider, SafeChatTurnHooks, SafeFunctionHooks, SafeProviderHooks,
    SessionStore,
};

#[derive(Clone)]
pub struct RuntimeBundle {
    pub store: Arc<dyn SessionStore>,
    pub functions: Arc<FunctionRegistry>,
    pub orchestrator: ChatOrchestrator,
}

pub fn in_memory_store() -> Arc<dyn SessionStore> {
    Arc::new(InMemorySessionStore::new())
}

/// Empty registry reporting executions to tracing and metrics.
pub fn observed_functions() -> Arc<FunctionRegistry> {
    Arc::new(
        FunctionRegistry::new()
            .with_hooks(Arc::new(SafeFunctionHooks::new(CompositeHooks::new()))),
    )
}

/// Bare orchestrator with defaults and no observability hooks.
pub fn orchestrator(provider: Arc<dyn ModelProvider>) -> Result<ChatOrchestrator, ChatError> {
    ChatOrchestrator::builder(provider).build()
}

pub fn build_runtime(provider: Arc<dyn ModelProvider>) -> Result<RuntimeBundle, ChatError> {
    build_runtime_with(provider, in_memory_store(), ChatPolicy::default())
}

/// Functions are registered on the returned bundle's registry; it is shared
/// with the orchestrator, so later registrations are visible to new turns.
pub fn build_runtime_with(
    provider: Arc<dyn ModelProvider>,
    store: Arc<dyn SessionStore>,
    policy: ChatPolicy,
) -> Result<RuntimeBundle, ChatError> {
    let functions = observed_functions();

    let orchestrator = ChatOrchestrator::builder(provider)
        .store(Arc::clone(&store))
        .functions(Arc::clone(&functions))
        .policy(policy)
        .provider_hooks(Arc::new(SafeProviderHooks::new(CompositeHooks::new())))
        .turn_hooks(Arc::new(SafeChatTurnHooks::new(CompositeHooks::new())))
        .build()?;

    Ok(RuntimeBundle {
        store,
        functions,
        orchestrator,
    })
}
