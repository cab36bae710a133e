use std::sync::Arc;

use outreach_core::domain::is_usable_secret;
use outreach_core::domain::slack::SlackChannelInfo;
use outreach_core::CredentialCache;
use tracing::{error, info};

use crate::web::SlackApi;

/// Lists channels a bot token can see and remembers that token per channel.
#[derive(Clone)]
pub struct ChannelDirectory {
    api: Arc<dyn SlackApi>,
    tokens: Arc<CredentialCache>,
}

impl ChannelDirectory {
    pub fn new(api: Arc<dyn SlackApi>, tokens: Arc<CredentialCache>) -> Self {
        Self { api, tokens }
    }

    /// Slack-level failures come back as a single `ERROR` pseudo-channel whose
    /// name explains the problem; transport failures yield an empty list.
    pub async fn list_channels(&self, bot_token: &str) -> Vec<SlackChannelInfo> {
        if !is_usable_secret(Some(bot_token)) {
            error!(event_name = "slack.channels.invalid_token", "unusable bot token supplied");
            return Vec::new();
        }

        let listing = match self.api.conversations_list(bot_token).await {
            Ok(listing) => listing,
            Err(err) => {
                error!(event_name = "slack.channels.request_failed", error = %err, "channel listing failed");
                return Vec::new();
            }
        };

        if !listing.ok {
            let code = listing.error.unwrap_or_else(|| "Unknown error".to_string());
            error!(event_name = "slack.channels.api_error", code = %code, "slack rejected channel listing");
            return vec![SlackChannelInfo::error(describe_error(&code))];
        }

        let mut channels = Vec::with_capacity(listing.channels.len());
        for conversation in listing.channels {
            if let (Some(id), Some(name)) = (conversation.id, conversation.name) {
                self.tokens.store(&id, bot_token).await;
                channels.push(SlackChannelInfo { id, name });
            }
        }

        info!(event_name = "slack.channels.listed", count = channels.len(), "slack channels listed");
        channels
    }
}

fn describe_error(code: &str) -> String {
    match code {
        "missing_scope" => "Bot token missing required scopes: channels:read, groups:read".to_string(),
        "invalid_auth" | "not_authed" => "Invalid or expired bot token".to_string(),
        other => format!("Slack API error: {other}"),
    }
}
