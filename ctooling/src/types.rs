//! Execution context and normalized function results.
//!
//! ```rust
//! use ctooling::FunctionCallResult;
//! use serde_json::json;
//!
//! let ok = FunctionCallResult::ok(json!({"id": 7}));
//! assert!(ok.success);
//! assert_eq!(ok.to_wire_string(), r#"{"success":true,"payload":{"id":7}}"#);
//!
//! let failed = FunctionCallResult::failure("function not found: create_entity");
//! assert_eq!(failed.error.as_deref(), Some("function not found: create_entity"));
//! ```

use ccommon::{MetadataMap, SessionId, TraceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FunctionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionExecutionContext {
    pub session_id: SessionId,
    pub trace_id: Option<TraceId>,
    pub call_id: Option<String>,
    pub metadata: MetadataMap,
}

impl FunctionExecutionContext {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            trace_id: None,
            call_id: None,
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one handler invocation: either a payload or an error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FunctionCallResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// JSON text fed back to the provider as FUNCTION-message content.
    pub fn to_wire_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|error| {
            format!(r#"{{"success":false,"error":"unserializable result: {error}"}}"#)
        })
    }
}

impl From<Result<Value, FunctionError>> for FunctionCallResult {
    fn from(result: Result<Value, FunctionError>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(error) => Self::failure(error.message),
        }
    }
}
