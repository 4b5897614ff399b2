//! Production-friendly observability hooks for provider dispatch, business
//! function execution, and chat turns.
//!
//! ```rust
//! use cobserve::{MetricsObservabilityHooks, SafeProviderHooks, TracingObservabilityHooks};
//!
//! let _provider_hooks = SafeProviderHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod composite;
mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use composite::CompositeHooks;
pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeChatTurnHooks, SafeFunctionHooks, SafeProviderHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        CompositeHooks, MetricsObservabilityHooks, SafeChatTurnHooks, SafeFunctionHooks,
        SafeProviderHooks, TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
