use serde::{Deserialize, Serialize};

/// Channel name shown when the caller does not supply one.
pub const DEFAULT_CHANNEL_NAME: &str = "channel";

/// Id of the pseudo-channel used to surface Slack API errors in channel lists.
pub const ERROR_CHANNEL_ID: &str = "ERROR";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SlackMessageRequest {
    pub content_prompt: String,
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub bot_token: Option<String>,
}

impl SlackMessageRequest {
    pub fn display_channel(&self) -> String {
        self.channel_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_CHANNEL_NAME)
            .to_string()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SlackMessageResponse {
    pub success: bool,
    pub message: String,
    pub channel_name: Option<String>,
    pub message_content: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackChannelInfo {
    pub id: String,
    pub name: String,
}

impl SlackChannelInfo {
    pub fn error(name: impl Into<String>) -> Self {
        Self { id: ERROR_CHANNEL_ID.to_string(), name: name.into() }
    }

    pub fn is_error(&self) -> bool {
        self.id == ERROR_CHANNEL_ID
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelListResponse {
    pub channels: Vec<SlackChannelInfo>,
}

#[cfg(test)]
mod tests {
    use super::{SlackChannelInfo, SlackMessageRequest};

    #[test]
    fn display_channel_falls_back_to_placeholder() {
        let mut request: SlackMessageRequest =
            serde_json::from_str(r#"{"content_prompt":"Ship it","channel_id":"C1"}"#)
                .expect("request parses");
        assert_eq!(request.display_channel(), "channel");

        request.channel_name = Some("general".to_string());
        assert_eq!(request.display_channel(), "general");
    }

    #[test]
    fn error_channel_is_flagged() {
        assert!(SlackChannelInfo::error("Invalid or expired bot token").is_error());
    }
}
