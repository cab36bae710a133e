use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::client::{ActionResponse, BrokerError, IntegrationBroker};

pub const UNKNOWN_RESPONSE_ERROR: &str = "Unknown error in response format";

/// User-facing failure text from a channel service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DispatchError(pub String);

impl DispatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    Succeeded { data: Option<Value> },
    Failed { error: Option<String> },
}

impl ActionOutcome {
    pub fn interpret(response: &ActionResponse) -> Self {
        let flagged = response.successfull == Some(true) || response.success == Some(true);
        let has_data = response.data.as_ref().is_some_and(is_truthy);
        if flagged || has_data {
            return Self::Succeeded { data: response.data.clone() };
        }

        Self::Failed { error: failure_reason(response) }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Failure text, or `fallback` when the broker gave no reason.
    pub fn error_or(&self, fallback: &str) -> Option<String> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { error } => Some(error.clone().unwrap_or_else(|| fallback.to_string())),
        }
    }
}

/// Truthiness the broker's loosely typed payloads are judged by.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// The broker's own error text, if it sent any.
pub fn failure_reason(response: &ActionResponse) -> Option<String> {
    match response.error.as_ref()? {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Tries each action name in turn; the broker has renamed actions across versions.
/// Transport and HTTP errors fall through to the next name; the last error is returned.
pub async fn execute_first_available(
    broker: &dyn IntegrationBroker,
    actions: &[&str],
    input: &Value,
    entity_id: &str,
) -> Result<ActionResponse, BrokerError> {
    let mut last_error = BrokerError::Transport("no action names supplied".to_string());
    for (index, action) in actions.iter().enumerate() {
        match broker.execute_action(action, input.clone(), entity_id).await {
            Ok(response) => return Ok(response),
            Err(error) => {
                warn!(
                    event_name = "broker.action.fallback",
                    action,
                    attempt = index + 1,
                    error = %error,
                    "broker action attempt failed"
                );
                last_error = error;
            }
        }
    }
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ActionOutcome, UNKNOWN_RESPONSE_ERROR};
    use crate::client::ActionResponse;

    #[test]
    fn any_success_signal_is_enough() {
        let flagged = ActionResponse { successfull: Some(true), ..ActionResponse::default() };
        let alt_flag = ActionResponse { success: Some(true), ..ActionResponse::default() };
        let data = ActionResponse { data: Some(json!({"id": "msg-1"})), ..ActionResponse::default() };

        assert!(ActionOutcome::interpret(&flagged).is_success());
        assert!(ActionOutcome::interpret(&alt_flag).is_success());
        assert!(ActionOutcome::interpret(&data).is_success());
    }

    #[test]
    fn empty_data_without_flags_is_a_failure() {
        let response = ActionResponse {
            data: Some(json!({})),
            error: Some(json!("channel_not_found")),
            successfull: Some(false),
            success: None,
        };

        let outcome = ActionOutcome::interpret(&response);
        assert_eq!(outcome.error_or(UNKNOWN_RESPONSE_ERROR).as_deref(), Some("channel_not_found"));
    }

    #[test]
    fn silent_failure_uses_fallback_text() {
        let outcome = ActionOutcome::interpret(&ActionResponse::default());
        assert_eq!(outcome.error_or(UNKNOWN_RESPONSE_ERROR).as_deref(), Some(UNKNOWN_RESPONSE_ERROR));
    }
}
