use std::sync::Arc;

use outreach_core::domain::connection::{ConnectionApp, SetupResponse};
use serde_json::{json, Map};
use tracing::{error, info};

use crate::client::IntegrationBroker;
use crate::connection::setup_integration;
use crate::outcome::{ActionOutcome, DispatchError, UNKNOWN_RESPONSE_ERROR};

pub const SEND_EMAIL_ACTION: &str = "GMAIL_SEND_EMAIL";

#[derive(Clone)]
pub struct GmailService {
    broker: Arc<dyn IntegrationBroker>,
}

impl GmailService {
    pub fn new(broker: Arc<dyn IntegrationBroker>) -> Self {
        Self { broker }
    }

    pub async fn setup(&self, entity_id: &str) -> SetupResponse {
        setup_integration(self.broker.as_ref(), ConnectionApp::Gmail, entity_id, Map::new()).await
    }

    pub async fn send(
        &self,
        recipient_email: &str,
        subject: &str,
        body: &str,
        entity_id: &str,
    ) -> Result<String, DispatchError> {
        let input = json!({
            "recipient_email": recipient_email,
            "subject": subject,
            "body": body,
        });

        let response = self
            .broker
            .execute_action(SEND_EMAIL_ACTION, input, entity_id)
            .await
            .map_err(|err| {
                error!(event_name = "gmail.send.transport_failed", error = %err, "broker call failed");
                DispatchError::new(format!("Error using Composio API for Gmail: {err}"))
            })?;

        match ActionOutcome::interpret(&response).error_or(UNKNOWN_RESPONSE_ERROR) {
            None => {
                info!(event_name = "gmail.send.succeeded", recipient = recipient_email, "email sent");
                Ok(format!("Email successfully sent to {recipient_email}"))
            }
            Some(reason) => Err(DispatchError::new(format!("Failed to send email: {reason}"))),
        }
    }
}
