//! Small convenience constructors for common types.

use serde_json::Value;

use crate::{ChatTurnRequest, FunctionDefinition, Message, Role, SessionId, SessionStatus};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::new(Role::System, content)
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::new(Role::User, content)
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::new(Role::Assistant, content)
}

/// Definition taking no arguments when `parameters` is `Value::Null`.
pub fn function_definition(
    name: impl Into<String>,
    description: impl Into<String>,
    parameters: Value,
) -> FunctionDefinition {
    let parameters = if parameters.is_null() {
        serde_json::json!({"type": "object", "properties": {}})
    } else {
        parameters
    };

    FunctionDefinition::new(name, description, parameters)
}

pub fn turn(session_id: impl Into<SessionId>, user_input: impl Into<String>) -> ChatTurnRequest {
    ChatTurnRequest::new(session_id, user_input)
}

pub fn parse_session_status(value: &str) -> Option<SessionStatus> {
    match value.trim().to_ascii_uppercase().as_str() {
        "ACTIVE" => Some(SessionStatus::Active),
        "PAUSED" => Some(SessionStatus::Paused),
        "COMPLETED" => Some(SessionStatus::Completed),
        "CLOSED" => Some(SessionStatus::Closed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{Role, SessionStatus};

    use super::{function_definition, parse_session_status, turn, user_message};

    #[test]
    fn parse_session_status_is_case_insensitive() {
        assert_eq!(parse_session_status("active"), Some(SessionStatus::Active));
        assert_eq!(parse_session_status(" Paused "), Some(SessionStatus::Paused));
        assert_eq!(parse_session_status("CLOSED"), Some(SessionStatus::Closed));
        assert_eq!(parse_session_status("archived"), None);
    }

    #[test]
    fn message_and_turn_helpers_apply_expected_defaults() {
        let message = user_message("hello");
        assert_eq!(message.role, Role::User);

        let request = turn("session-1", "hello");
        assert_eq!(request.session_id.as_str(), "session-1");
        assert!(request.delivery.is_none());
        assert!(request.trace_id.is_none());
    }

    #[test]
    fn function_definition_defaults_to_empty_object_schema() {
        let definition = function_definition("list_reports", "Lists reports", Value::Null);
        assert_eq!(
            definition.parameters,
            json!({"type": "object", "properties": {}})
        );
    }
}
