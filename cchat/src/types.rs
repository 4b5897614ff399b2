//! Chat messages, delivery events, and turn request/result types.

use ccommon::{MessageId, SessionId, TraceId};
use chrono::{DateTime, Utc};
use cprovider::{FunctionArguments, FunctionCall, Message, Role, TokenUsage};
use ctooling::FunctionCallResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ChatError, DeliveryOptions, DeliveryReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub session_id: SessionId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    /// Opaque UI payloads attached by the host; never interpreted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_component_references: Option<Vec<Value>>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<MessageId>,
}

impl ChatMessage {
    pub fn new(session_id: SessionId, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            session_id,
            role,
            content: Some(content.into()),
            function_call: None,
            ui_component_references: None,
            timestamp: Utc::now(),
            parent_message_id: None,
        }
    }

    pub fn user(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, Role::User, content)
    }

    pub fn assistant(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, Role::Assistant, content)
    }

    pub fn system(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, Role::System, content)
    }

    /// FUNCTION-role message carrying both the call and its serialized result.
    pub fn function(session_id: SessionId, call: FunctionCall, result: &FunctionCallResult) -> Self {
        let mut message = Self::new(session_id, Role::Function, result.to_wire_string());
        message.function_call = Some(call);
        message
    }

    pub fn with_parent(mut self, parent_message_id: MessageId) -> Self {
        self.parent_message_id = Some(parent_message_id);
        self
    }

    pub fn with_ui_components(mut self, references: Vec<Value>) -> Self {
        self.ui_component_references = Some(references);
        self
    }

    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.role == Role::Function && self.function_call.is_none() {
            return Err(ChatError::invalid_request(format!(
                "function message '{}' has no function call",
                self.id
            )));
        }

        Ok(())
    }

    pub fn to_provider_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
            function_call: self.function_call.clone(),
        }
    }
}

/// One unit of the paced output protocol.
///
/// Serialized adjacently tagged: `{"type": "token", "data": "Hel"}`.
///
/// ```rust
/// use cchat::DeliveryEvent;
///
/// let json = serde_json::to_string(&DeliveryEvent::TokenChunk("hi".into())).unwrap();
/// assert_eq!(json, r#"{"type":"token","data":"hi"}"#);
///
/// let frame = DeliveryEvent::Completed("done".into()).to_sse_frame();
/// assert_eq!(frame, "event: completed\ndata: \"done\"\n\n");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DeliveryEvent {
    Thinking,
    #[serde(rename = "token")]
    TokenChunk(String),
    #[serde(rename = "function_call")]
    FunctionCallRequested {
        name: String,
        arguments: FunctionArguments,
    },
    #[serde(rename = "function_result")]
    FunctionCallCompleted {
        name: String,
        result: FunctionCallResult,
    },
    Completed(String),
    Error(String),
}

impl DeliveryEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::TokenChunk(_) => "token",
            Self::FunctionCallRequested { .. } => "function_call",
            Self::FunctionCallCompleted { .. } => "function_result",
            Self::Completed(_) => "completed",
            Self::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Error(_))
    }

    /// Server-sent-events frame: `event: <type>` plus the JSON `data` field.
    pub fn to_sse_frame(&self) -> String {
        let data = serde_json::to_value(self)
            .ok()
            .and_then(|mut value| value.get_mut("data").map(Value::take))
            .unwrap_or(Value::Null);

        format!("event: {}\ndata: {}\n\n", self.kind(), data)
    }
}

/// Per-turn generation overrides.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatTurnOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatTurnOptions {
    pub fn validate(&self) -> Result<(), ChatError> {
        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ChatError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        if self.max_tokens == Some(0) {
            return Err(ChatError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurnRequest {
    pub session_id: SessionId,
    pub user_input: String,
    pub options: ChatTurnOptions,
    pub delivery: Option<DeliveryOptions>,
    pub trace_id: Option<TraceId>,
}

impl ChatTurnRequest {
    pub fn new(session_id: impl Into<SessionId>, user_input: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_input: user_input.into(),
            options: ChatTurnOptions::default(),
            delivery: None,
            trace_id: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_options(mut self, options: ChatTurnOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_delivery_options(mut self, delivery: DeliveryOptions) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.user_input.trim().is_empty() {
            return Err(ChatError::invalid_request("user_input must not be empty"));
        }

        self.options.validate()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurnResult {
    pub session_id: SessionId,
    pub trace_id: TraceId,
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
    pub function_messages: Vec<ChatMessage>,
    pub function_rounds: u32,
    pub round_limit_reached: bool,
    pub usage: TokenUsage,
    pub delivery: DeliveryReport,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn delivery_events_use_wire_tags() {
        let mut arguments = FunctionArguments::new();
        arguments.insert("name".to_string(), json!("Acme"));

        let cases = vec![
            (DeliveryEvent::Thinking, json!({"type": "thinking"})),
            (
                DeliveryEvent::TokenChunk("Hel".to_string()),
                json!({"type": "token", "data": "Hel"}),
            ),
            (
                DeliveryEvent::FunctionCallRequested {
                    name: "create_entity".to_string(),
                    arguments,
                },
                json!({"type": "function_call", "data": {"name": "create_entity", "arguments": {"name": "Acme"}}}),
            ),
            (
                DeliveryEvent::FunctionCallCompleted {
                    name: "create_entity".to_string(),
                    result: FunctionCallResult::failure("function not found: create_entity"),
                },
                json!({"type": "function_result", "data": {"name": "create_entity", "result": {"success": false, "error": "function not found: create_entity"}}}),
            ),
            (
                DeliveryEvent::Completed("done".to_string()),
                json!({"type": "completed", "data": "done"}),
            ),
            (
                DeliveryEvent::Error("provider down".to_string()),
                json!({"type": "error", "data": "provider down"}),
            ),
        ];

        for (event, expected) in cases {
            let value = serde_json::to_value(&event).expect("event should serialize");
            assert_eq!(value, expected);
            assert_eq!(value["type"], json!(event.kind()));
        }
    }

    #[test]
    fn sse_frame_for_unit_event_has_null_data() {
        assert_eq!(
            DeliveryEvent::Thinking.to_sse_frame(),
            "event: thinking\ndata: null\n\n"
        );
    }

    #[test]
    fn function_message_requires_call() {
        let session = SessionId::from("s");
        let result = FunctionCallResult::ok(json!({"id": 1}));
        let message = ChatMessage::function(
            session.clone(),
            FunctionCall::new("c1", "echo", FunctionArguments::new()),
            &result,
        );
        assert!(message.validate().is_ok());
        assert_eq!(message.text(), r#"{"success":true,"payload":{"id":1}}"#);

        let mut orphan = ChatMessage::new(session, Role::Function, "{}");
        orphan.function_call = None;
        assert!(orphan.validate().is_err());
    }

    #[test]
    fn turn_request_validation() {
        assert!(ChatTurnRequest::new("s", "  ").validate().is_err());
        assert!(
            ChatTurnRequest::new("s", "hi")
                .with_temperature(3.0)
                .validate()
                .is_err()
        );
        assert!(ChatTurnRequest::new("s", "hi").with_max_tokens(16).validate().is_ok());
    }
}
