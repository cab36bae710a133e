use outreach_core::domain::connection::{ConnectionApp, SetupResponse};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::client::{BrokerError, IntegrationBroker};

/// Starts (or confirms) a broker connection for `app` and describes the next step.
pub async fn setup_integration(
    broker: &dyn IntegrationBroker,
    app: ConnectionApp,
    entity_id: &str,
    params: Map<String, Value>,
) -> SetupResponse {
    match try_setup(broker, app, entity_id, params).await {
        Ok(response) => response,
        Err(err) => {
            error!(event_name = "broker.setup.failed", app = app.broker_name(), error = %err, "integration setup failed");
            SetupResponse {
                success: false,
                message: format!("Error setting up {app} integration: {err}"),
                redirect_url: None,
            }
        }
    }
}

async fn try_setup(
    broker: &dyn IntegrationBroker,
    app: ConnectionApp,
    entity_id: &str,
    params: Map<String, Value>,
) -> Result<SetupResponse, BrokerError> {
    let connection = broker.initiate_connection(app, entity_id, params).await?;

    if let Some(redirect_url) = connection.redirect_url.filter(|url| !url.is_empty()) {
        info!(event_name = "broker.setup.redirect", app = app.broker_name(), entity_id, "authentication URL generated");
        return Ok(SetupResponse {
            success: true,
            message: format!(
                "Please complete {app} authentication by opening this URL in your browser"
            ),
            redirect_url: Some(redirect_url),
        });
    }

    if let Some(account_id) = connection.connected_account_id.as_deref() {
        let account = broker.get_connected_account(account_id).await?;
        if account.is_active() {
            info!(event_name = "broker.setup.active", app = app.broker_name(), entity_id, "connection is active");
            return Ok(success(format!("{app} connection is active")));
        }
    }

    if app.uses_api_credentials() {
        info!(event_name = "broker.setup.created", app = app.broker_name(), entity_id, "connection created with API credentials");
        return Ok(success(format!("{app} connection created successfully with your API credentials")));
    }

    Ok(SetupResponse {
        success: false,
        message: format!("Failed to setup {app} integration"),
        redirect_url: None,
    })
}

fn success(message: String) -> SetupResponse {
    SetupResponse { success: true, message, redirect_url: None }
}

#[cfg(test)]
mod tests {
    use outreach_core::domain::connection::ConnectionApp;
    use serde_json::Map;

    use super::setup_integration;
    use crate::client::{BrokerError, InitiatedConnection};
    use crate::memory::InMemoryBroker;

    #[tokio::test]
    async fn redirect_url_asks_user_to_authenticate() {
        let broker = InMemoryBroker::new().with_connection(Ok(InitiatedConnection {
            redirect_url: Some("https://auth.example/gmail".to_string()),
            ..InitiatedConnection::default()
        }));

        let response = setup_integration(&broker, ConnectionApp::Gmail, "default", Map::new()).await;

        assert!(response.success);
        assert_eq!(response.redirect_url.as_deref(), Some("https://auth.example/gmail"));
        assert_eq!(
            response.message,
            "Please complete Gmail authentication by opening this URL in your browser"
        );
    }

    #[tokio::test]
    async fn active_account_is_reported() {
        let broker = InMemoryBroker::new()
            .with_connection(Ok(InitiatedConnection {
                connected_account_id: Some("ca_9".to_string()),
                ..InitiatedConnection::default()
            }))
            .with_account("ca_9", "ACTIVE");

        let response = setup_integration(&broker, ConnectionApp::Slack, "default", Map::new()).await;

        assert!(response.success);
        assert_eq!(response.message, "Slack connection is active");
        assert_eq!(response.redirect_url, None);
    }

    #[tokio::test]
    async fn oauth_app_without_redirect_fails_but_credential_app_succeeds() {
        let gmail = setup_integration(&InMemoryBroker::new(), ConnectionApp::Gmail, "default", Map::new()).await;
        assert!(!gmail.success);
        assert_eq!(gmail.message, "Failed to setup Gmail integration");

        let whatsapp =
            setup_integration(&InMemoryBroker::new(), ConnectionApp::WhatsApp, "acme", Map::new()).await;
        assert!(whatsapp.success);
        assert_eq!(whatsapp.message, "WhatsApp connection created successfully with your API credentials");
    }

    #[tokio::test]
    async fn broker_errors_become_setup_failures() {
        let broker = InMemoryBroker::new()
            .with_connection(Err(BrokerError::Transport("connection refused".to_string())));

        let response = setup_integration(&broker, ConnectionApp::LinkedIn, "default", Map::new()).await;

        assert!(!response.success);
        assert_eq!(
            response.message,
            "Error setting up LinkedIn integration: broker request failed: connection refused"
        );
    }
}
