//! Function registry through which an AI provider calls back into host logic.

mod args;
mod error;
mod function;
mod hooks;
mod registry;
mod types;

pub mod prelude {
    pub use crate::{
        BusinessFunction, FunctionCallResult, FunctionError, FunctionErrorKind,
        FunctionExecutionContext, FunctionFuture, FunctionHandler, FunctionHooks,
        FunctionRegistry, NoopFunctionHooks,
    };
}

pub use args::{optional_string, parse_arguments, parse_json_object, required_string};
pub use error::{FunctionError, FunctionErrorKind};
pub use function::{BusinessFunction, FunctionFuture, FunctionHandler};
pub use hooks::{FunctionHooks, NoopFunctionHooks};
pub use registry::FunctionRegistry;
pub use types::{FunctionCallResult, FunctionExecutionContext};
