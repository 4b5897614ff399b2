//! Name-addressed function registry shared across sessions.
//!
//! The registry normalizes every execution outcome into a
//! [`FunctionCallResult`]: unknown names, handler errors, panics and timeouts
//! all come back as failure results so a streaming turn can feed them to the
//! provider instead of aborting.
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use cprovider::{FunctionArguments, FunctionDefinition};
//! use ctooling::{FunctionExecutionContext, FunctionRegistry};
//! use serde_json::json;
//!
//! let registry = FunctionRegistry::new();
//! registry
//!     .register_sync_fn(
//!         FunctionDefinition::new("ping", "Health check", json!({"type": "object"})),
//!         |_args, _ctx| Ok(json!("pong")),
//!     )
//!     .expect("name is valid");
//!
//! let context = FunctionExecutionContext::new("session-1");
//! let result = registry.execute("ping", FunctionArguments::new(), &context).await;
//! assert_eq!(result.payload, Some(json!("pong")));
//!
//! let missing = registry.execute("nope", FunctionArguments::new(), &context).await;
//! assert_eq!(missing.error.as_deref(), Some("function not found: nope"));
//! # }
//! ```

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;

use ccommon::Registry;
use cprovider::{FunctionArguments, FunctionCall, FunctionDefinition};
use futures_timer::Delay;
use futures_util::FutureExt;
use futures_util::future::{Either, select};
use serde_json::Value;

use crate::{
    BusinessFunction, FunctionCallResult, FunctionError, FunctionExecutionContext, FunctionHooks,
    NoopFunctionHooks,
};

pub struct FunctionRegistry {
    functions: Registry<String, Arc<BusinessFunction>>,
    hooks: Arc<dyn FunctionHooks>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self {
            functions: Registry::new(),
            hooks: Arc::new(NoopFunctionHooks),
        }
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn FunctionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Stores `function` under its name. A previous entry with the same name is
    /// replaced.
    pub fn register(&self, function: BusinessFunction) -> Result<(), FunctionError> {
        let name = function.name().to_string();
        if name.trim().is_empty() {
            return Err(FunctionError::invalid_function(
                "function name must not be empty",
            ));
        }

        // The stored key is also the advertised name, so it must be callable verbatim.
        if name.trim() != name {
            return Err(FunctionError::invalid_function(format!(
                "function name '{name}' has surrounding whitespace"
            )));
        }

        if self.functions.insert(name.clone(), Arc::new(function)).is_some() {
            tracing::warn!(function = %name, "function re-registered; previous handler replaced");
        } else {
            tracing::debug!(function = %name, "function registered");
        }

        Ok(())
    }

    pub fn register_fn<F, Fut>(
        &self,
        definition: FunctionDefinition,
        handler: F,
    ) -> Result<(), FunctionError>
    where
        F: Fn(FunctionArguments, FunctionExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FunctionError>> + Send + 'static,
    {
        self.register(BusinessFunction::from_fn(definition, handler))
    }

    pub fn register_sync_fn<F>(
        &self,
        definition: FunctionDefinition,
        handler: F,
    ) -> Result<(), FunctionError>
    where
        F: Fn(FunctionArguments, FunctionExecutionContext) -> Result<Value, FunctionError>
            + Send
            + Sync
            + 'static,
    {
        let handler = Arc::new(handler);
        self.register_fn(definition, move |arguments, context| {
            let handler = Arc::clone(&handler);
            async move { handler(arguments, context) }
        })
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<BusinessFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Definitions advertised to the provider, sorted by name.
    pub fn all_definitions(&self) -> Vec<FunctionDefinition> {
        let mut definitions = self
            .functions
            .values()
            .into_iter()
            .map(|function| function.definition().clone())
            .collect::<Vec<_>>();
        definitions.sort_by(|left, right| left.name.cmp(&right.name));
        definitions
    }

    pub async fn execute_call(
        &self,
        call: &FunctionCall,
        context: &FunctionExecutionContext,
    ) -> FunctionCallResult {
        let context = context.clone().with_call_id(call.id.clone());
        self.execute(&call.name, call.arguments.clone(), &context)
            .await
    }

    pub async fn execute(
        &self,
        name: &str,
        arguments: FunctionArguments,
        context: &FunctionExecutionContext,
    ) -> FunctionCallResult {
        let started = Instant::now();
        self.hooks.on_execution_start(name, context);

        let outcome = match self.functions.get(name) {
            Some(function) => run_guarded(&function, arguments, context).await,
            None => Err(FunctionError::not_found(name)),
        };

        match outcome {
            Ok(payload) => {
                let result = FunctionCallResult::ok(payload);
                self.hooks
                    .on_execution_success(name, context, &result, started.elapsed());
                result
            }
            Err(error) => {
                let error = match &context.call_id {
                    Some(call_id) => error.with_call_id(call_id.clone()),
                    None => error,
                };
                tracing::debug!(function = %name, error = %error, "function execution failed");
                self.hooks
                    .on_execution_failure(name, context, &error, started.elapsed());
                FunctionCallResult::failure(error.message)
            }
        }
    }
}

async fn run_guarded(
    function: &BusinessFunction,
    arguments: FunctionArguments,
    context: &FunctionExecutionContext,
) -> Result<Value, FunctionError> {
    let name = function.name();
    let invocation = AssertUnwindSafe(async move { function.handler().call(arguments, context).await })
        .catch_unwind();

    let caught = match function.timeout() {
        Some(timeout) => {
            let invocation = pin!(invocation);
            match select(invocation, Delay::new(timeout)).await {
                Either::Left((caught, _)) => caught,
                Either::Right(_) => return Err(FunctionError::timeout(name)),
            }
        }
        None => invocation.await,
    };

    match caught {
        Ok(result) => result.map_err(|error| match error.function_name {
            Some(_) => error,
            None => error.with_function_name(name),
        }),
        Err(panic) => Err(FunctionError::panicked(name, &panic_detail(panic.as_ref()))),
    }
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.len())
            .finish_non_exhaustive()
    }
}
