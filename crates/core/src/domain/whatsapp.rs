use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{default_entity_id, entity_id_or_default, null_as_default};

const MIN_PHONE_DIGITS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WhatsAppSetupRequest {
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub phone_number_id: String,
    #[serde(default)]
    pub entity_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WhatsAppMessageRequest {
    pub content_prompt: String,
    pub phone_number: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_entity_id", deserialize_with = "entity_id_or_default")]
    pub entity_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WhatsAppMediaRequest {
    pub phone_number: String,
    pub media_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub caption: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_entity_id", deserialize_with = "entity_id_or_default")]
    pub entity_id: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WhatsAppTemplateRequest {
    pub template_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub template_params: BTreeMap<String, Value>,
    pub phone_number: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_entity_id", deserialize_with = "entity_id_or_default")]
    pub entity_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WhatsAppMessageResponse {
    pub success: bool,
    pub message: String,
    pub phone_number: Option<String>,
    pub message_content: Option<String>,
    pub error: Option<String>,
}

/// Recipient number reduced to digits, the form the broker expects (no `+`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("Phone number cannot be empty".to_string());
        }

        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() < MIN_PHONE_DIGITS {
            return Err(format!(
                "Phone number {raw} is too short. It should include country code and at least 10 digits."
            ));
        }

        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{PhoneNumber, WhatsAppTemplateRequest};

    #[test]
    fn strips_formatting_and_plus_sign() {
        let phone = PhoneNumber::parse("+91 639-857-1463").expect("valid number");
        assert_eq!(phone.as_str(), "916398571463");
    }

    #[test]
    fn rejects_empty_and_short_numbers() {
        assert_eq!(PhoneNumber::parse("").unwrap_err(), "Phone number cannot be empty");

        let error = PhoneNumber::parse("+1 555 0101").unwrap_err();
        assert!(error.contains("is too short"));
        assert!(error.starts_with("Phone number +1 555 0101"));
    }

    #[test]
    fn template_params_keep_numbered_keys() {
        let request: WhatsAppTemplateRequest = serde_json::from_str(
            r#"{"template_name":"hello_world","template_params":{"1":"John Doe"},"phone_number":"916398571463"}"#,
        )
        .expect("request parses");

        assert_eq!(request.template_params.get("1").and_then(|v| v.as_str()), Some("John Doe"));
        assert_eq!(request.entity_id, "default");
    }
}
