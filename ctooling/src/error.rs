//! Function registration and execution errors.
//!
//! Only [`FunctionErrorKind::InvalidFunction`] ever reaches a caller of the
//! registry as an `Err`; every execution-time kind is folded into a failure
//! [`crate::FunctionCallResult`].

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionErrorKind {
    InvalidFunction,
    NotFound,
    InvalidArguments,
    Execution,
    Timeout,
    Panicked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionError {
    pub kind: FunctionErrorKind,
    pub message: String,
    pub function_name: Option<String>,
    pub call_id: Option<String>,
}

impl FunctionError {
    pub fn new(kind: FunctionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            function_name: None,
            call_id: None,
        }
    }

    pub fn invalid_function(message: impl Into<String>) -> Self {
        Self::new(FunctionErrorKind::InvalidFunction, message)
    }

    pub fn not_found(name: &str) -> Self {
        Self::new(FunctionErrorKind::NotFound, format!("function not found: {name}"))
            .with_function_name(name)
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(FunctionErrorKind::InvalidArguments, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(FunctionErrorKind::Execution, message)
    }

    pub fn timeout(name: &str) -> Self {
        Self::new(FunctionErrorKind::Timeout, format!("function timed out: {name}"))
            .with_function_name(name)
    }

    pub fn panicked(name: &str, detail: &str) -> Self {
        Self::new(
            FunctionErrorKind::Panicked,
            format!("function panicked: {name}: {detail}"),
        )
        .with_function_name(name)
    }

    pub fn with_function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }

    /// Errors caused by what the provider asked for rather than by host code.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self.kind,
            FunctionErrorKind::NotFound | FunctionErrorKind::InvalidArguments
        )
    }
}

impl Display for FunctionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.function_name, &self.call_id) {
            (Some(name), Some(call_id)) => write!(
                f,
                "{:?} [function={}, call_id={}]: {}",
                self.kind, name, call_id, self.message
            ),
            (Some(name), None) => {
                write!(f, "{:?} [function={}]: {}", self.kind, name, self.message)
            }
            _ => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for FunctionError {}

impl From<serde_json::Error> for FunctionError {
    fn from(error: serde_json::Error) -> Self {
        Self::invalid_arguments(format!("invalid arguments: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_constructors_render_stable_messages() {
        assert_eq!(
            FunctionError::not_found("create_entity").message,
            "function not found: create_entity"
        );
        assert_eq!(
            FunctionError::timeout("slow").message,
            "function timed out: slow"
        );
        assert!(FunctionError::not_found("x").is_caller_error());
        assert!(!FunctionError::execution("boom").is_caller_error());
    }

    #[test]
    fn context_fields_are_included_in_display() {
        let error = FunctionError::execution("db down")
            .with_function_name("lookup")
            .with_call_id("call_1");

        let rendered = error.to_string();
        assert!(rendered.contains("lookup"));
        assert!(rendered.contains("call_1"));
        assert!(rendered.contains("db down"));
    }
}
