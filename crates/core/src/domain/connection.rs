use serde::{Deserialize, Serialize};

use crate::domain::{default_entity_id, entity_id_or_default};

/// Third-party apps the integration broker can connect on a user's behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionApp {
    Gmail,
    Slack,
    LinkedIn,
    WhatsApp,
}

impl ConnectionApp {
    /// Identifier the broker uses for the app.
    pub fn broker_name(self) -> &'static str {
        match self {
            Self::Gmail => "GMAIL",
            Self::Slack => "SLACK",
            Self::LinkedIn => "LINKEDIN",
            Self::WhatsApp => "WHATSAPP",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Gmail => "Gmail",
            Self::Slack => "Slack",
            Self::LinkedIn => "LinkedIn",
            Self::WhatsApp => "WhatsApp",
        }
    }

    /// Apps connected with caller-supplied API credentials rather than an
    /// OAuth redirect.
    pub fn uses_api_credentials(self) -> bool {
        matches!(self, Self::WhatsApp)
    }
}

impl std::fmt::Display for ConnectionApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ConnectRequest {
    #[serde(default = "default_entity_id", deserialize_with = "entity_id_or_default")]
    pub entity_id: String,
}

impl Default for ConnectRequest {
    fn default() -> Self {
        Self { entity_id: default_entity_id() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SetupResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}
