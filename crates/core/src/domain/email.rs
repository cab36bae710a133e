use serde::{Deserialize, Serialize};

use crate::errors::ApplicationError;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EmailRequest {
    pub recipient_email: String,
    pub subject: String,
    pub content_prompt: String,
    #[serde(default = "default_is_formal")]
    pub is_formal: bool,
}

fn default_is_formal() -> bool {
    true
}

impl EmailRequest {
    pub fn validate(&self) -> Result<(), ApplicationError> {
        validate_email_address(&self.recipient_email)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EmailResponse {
    pub success: bool,
    pub message: String,
    pub email_content: Option<String>,
    pub error: Option<String>,
}

/// Structural address check: `local@domain.tld`, no whitespace.
pub fn validate_email_address(address: &str) -> Result<(), ApplicationError> {
    let invalid = || {
        ApplicationError::Validation(format!(
            "recipient_email: value is not a valid email address: `{address}`"
        ))
    };

    if address.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = address.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_email_address, EmailRequest};

    #[test]
    fn is_formal_defaults_to_true() {
        let request: EmailRequest = serde_json::from_str(
            r#"{"recipient_email":"a@example.com","subject":"Hi","content_prompt":"Say hi"}"#,
        )
        .expect("request parses");

        assert!(request.is_formal);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        for address in ["", "plain", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@b..com"] {
            assert!(validate_email_address(address).is_err(), "`{address}` should be rejected");
        }
    }

    #[test]
    fn accepts_common_addresses() {
        for address in ["recipient@example.com", "first.last+tag@mail.example.org"] {
            assert!(validate_email_address(address).is_ok(), "`{address}` should be accepted");
        }
    }
}
