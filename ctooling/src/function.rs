//! Business function contract: an advertised definition plus a handler.
//!
//! ```rust
//! use cprovider::FunctionDefinition;
//! use ctooling::BusinessFunction;
//! use serde_json::{Value, json};
//!
//! let function = BusinessFunction::from_fn(
//!     FunctionDefinition::new("echo", "Echoes input", json!({"type": "object"})),
//!     |args, _ctx| async move { Ok(Value::Object(args)) },
//! );
//!
//! assert_eq!(function.name(), "echo");
//! ```

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ccommon::BoxFuture;
use cprovider::{FunctionArguments, FunctionDefinition};
use serde_json::Value;

use crate::{FunctionError, FunctionExecutionContext};

pub type FunctionFuture<'a, T> = BoxFuture<'a, T>;

/// Host capability invoked when the provider calls a function by name.
pub trait FunctionHandler: Send + Sync {
    fn call<'a>(
        &'a self,
        arguments: FunctionArguments,
        context: &'a FunctionExecutionContext,
    ) -> FunctionFuture<'a, Result<Value, FunctionError>>;
}

type ClosureHandlerFn = dyn Fn(FunctionArguments, FunctionExecutionContext) -> FunctionFuture<'static, Result<Value, FunctionError>>
    + Send
    + Sync;

struct ClosureHandler {
    handler: Arc<ClosureHandlerFn>,
}

impl FunctionHandler for ClosureHandler {
    fn call<'a>(
        &'a self,
        arguments: FunctionArguments,
        context: &'a FunctionExecutionContext,
    ) -> FunctionFuture<'a, Result<Value, FunctionError>> {
        (self.handler)(arguments, context.clone())
    }
}

#[derive(Clone)]
pub struct BusinessFunction {
    definition: FunctionDefinition,
    handler: Arc<dyn FunctionHandler>,
    timeout: Option<Duration>,
}

impl BusinessFunction {
    pub fn new<H>(definition: FunctionDefinition, handler: H) -> Self
    where
        H: FunctionHandler + 'static,
    {
        Self {
            definition,
            handler: Arc::new(handler),
            timeout: None,
        }
    }

    pub fn from_fn<F, Fut>(definition: FunctionDefinition, handler: F) -> Self
    where
        F: Fn(FunctionArguments, FunctionExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FunctionError>> + Send + 'static,
    {
        let handler: Arc<ClosureHandlerFn> =
            Arc::new(move |arguments, context| Box::pin(handler(arguments, context)));

        Self::new(definition, ClosureHandler { handler })
    }

    /// Bounds each execution. Unbounded unless set.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &FunctionDefinition {
        &self.definition
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn handler(&self) -> &dyn FunctionHandler {
        self.handler.as_ref()
    }
}

impl Debug for BusinessFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusinessFunction")
            .field("name", &self.definition.name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
