//! Lifecycle hooks for function execution.
//!
//! ```rust
//! use ctooling::{FunctionHooks, NoopFunctionHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn FunctionHooks) {}
//!
//! let hooks = NoopFunctionHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use crate::{FunctionCallResult, FunctionError, FunctionExecutionContext};

pub trait FunctionHooks: Send + Sync {
    fn on_execution_start(&self, _name: &str, _context: &FunctionExecutionContext) {}

    fn on_execution_success(
        &self,
        _name: &str,
        _context: &FunctionExecutionContext,
        _result: &FunctionCallResult,
        _elapsed: Duration,
    ) {
    }

    fn on_execution_failure(
        &self,
        _name: &str,
        _context: &FunctionExecutionContext,
        _error: &FunctionError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFunctionHooks;

impl FunctionHooks for NoopFunctionHooks {}
