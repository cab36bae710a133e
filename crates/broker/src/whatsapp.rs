use std::collections::BTreeMap;
use std::sync::Arc;

use outreach_core::domain::connection::{ConnectionApp, SetupResponse};
use outreach_core::domain::is_usable_secret;
use outreach_core::domain::whatsapp::PhoneNumber;
use outreach_core::CredentialCache;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::client::IntegrationBroker;
use crate::connection::setup_integration;
use crate::outcome::{ActionOutcome, DispatchError, UNKNOWN_RESPONSE_ERROR};

pub const SEND_MESSAGE_ACTION: &str = "WHATSAPP_SEND_MESSAGE";
pub const SEND_MEDIA_ACTION: &str = "WHATSAPP_SEND_MEDIA";
pub const SEND_TEMPLATE_ACTION: &str = "WHATSAPP_SEND_TEMPLATE_MESSAGE";

#[derive(Clone, Debug, PartialEq)]
pub enum WhatsAppPayload {
    Text(String),
    Media { url: String, caption: String },
    Template { name: String, params: BTreeMap<String, Value> },
}

impl WhatsAppPayload {
    fn action(&self) -> &'static str {
        match self {
            Self::Text(_) => SEND_MESSAGE_ACTION,
            Self::Media { .. } => SEND_MEDIA_ACTION,
            Self::Template { .. } => SEND_TEMPLATE_ACTION,
        }
    }

    /// Noun used in result messages ("Media successfully sent to ...").
    fn label(&self) -> &'static str {
        match self {
            Self::Text(_) => "Message",
            Self::Media { .. } => "Media",
            Self::Template { .. } => "Template message",
        }
    }

    fn check(&self) -> Result<(), DispatchError> {
        match self {
            Self::Text(_) => Ok(()),
            Self::Media { url, .. } if url.is_empty() => {
                Err(DispatchError::new("Media URL is required for media messages"))
            }
            Self::Media { .. } => Ok(()),
            Self::Template { name, params } if name.is_empty() || params.is_empty() => Err(
                DispatchError::new("Template name and parameters are required for template messages"),
            ),
            Self::Template { .. } => Ok(()),
        }
    }

    fn input(&self, to_number: &str) -> Value {
        match self {
            Self::Text(text) => json!({ "to_number": to_number, "text": text }),
            Self::Media { url, caption } => {
                json!({ "to_number": to_number, "media_url": url, "caption": caption })
            }
            Self::Template { name, params } => {
                json!({ "to_number": to_number, "template_name": name, "template_params": params })
            }
        }
    }
}

#[derive(Clone)]
pub struct WhatsAppService {
    broker: Arc<dyn IntegrationBroker>,
    api_keys: Arc<CredentialCache>,
}

impl WhatsAppService {
    pub fn new(broker: Arc<dyn IntegrationBroker>, api_keys: Arc<CredentialCache>) -> Self {
        Self { broker, api_keys }
    }

    pub async fn setup(&self, auth_token: &str, phone_number_id: &str, entity_id: &str) -> SetupResponse {
        let mut params = Map::new();
        params.insert("auth_token".to_string(), Value::from(auth_token));
        params.insert("phone_number_id".to_string(), Value::from(phone_number_id));
        setup_integration(self.broker.as_ref(), ConnectionApp::WhatsApp, entity_id, params).await
    }

    pub async fn send(
        &self,
        phone_number: &str,
        payload: WhatsAppPayload,
        api_key: Option<&str>,
        entity_id: &str,
    ) -> Result<String, DispatchError> {
        if phone_number.is_empty() {
            return Err(DispatchError::new("Phone number is required"));
        }

        match api_key.filter(|key| is_usable_secret(Some(key))) {
            Some(key) => {
                self.api_keys.store(phone_number, key).await;
            }
            None if self.api_keys.get(phone_number).await.is_some() => {
                info!(event_name = "whatsapp.send.cached_key", "using cached API key for recipient");
            }
            None => {
                info!(event_name = "whatsapp.send.broker_key", "no API key supplied or cached; using broker credentials");
            }
        }

        payload.check()?;
        let phone = PhoneNumber::parse(phone_number).map_err(DispatchError::new)?;

        match &payload {
            WhatsAppPayload::Template { .. } => info!(
                event_name = "whatsapp.send.template",
                to = phone.as_str(),
                "template messages may be sent to any opted-in user"
            ),
            _ => warn!(
                event_name = "whatsapp.send.session_window",
                to = phone.as_str(),
                "delivery requires the recipient to have messaged within the last 24 hours"
            ),
        }

        let response = self
            .broker
            .execute_action(payload.action(), payload.input(phone.as_str()), entity_id)
            .await
            .map_err(|err| {
                error!(event_name = "whatsapp.send.transport_failed", error = %err, "broker call failed");
                DispatchError::new(format!("Error using Composio API: {err}"))
            })?;

        let label = payload.label();
        match ActionOutcome::interpret(&response).error_or(UNKNOWN_RESPONSE_ERROR) {
            None => Ok(format!("{label} successfully sent to {phone_number}")),
            Some(reason) => Err(DispatchError::new(format!(
                "Failed to send {} via Composio: {reason}",
                label.to_lowercase()
            ))),
        }
    }
}
