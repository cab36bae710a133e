use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{default_entity_id, entity_id_or_default};
use crate::errors::ApplicationError;

pub const DEFAULT_CONNECTION_NOTE: &str = "I'd like to connect with you on LinkedIn.";

fn default_search_limit() -> u32 {
    10
}

fn search_limit_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_else(default_search_limit))
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LinkedInProfileSearchRequest {
    pub keywords: String,
    pub access_token: String,
    #[serde(default = "default_search_limit", deserialize_with = "search_limit_or_default")]
    pub limit: u32,
    #[serde(default = "default_entity_id", deserialize_with = "entity_id_or_default")]
    pub entity_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LinkedInConnectionRequest {
    pub profile_url: String,
    #[serde(default)]
    pub message: Option<String>,
    pub access_token: String,
    #[serde(default = "default_entity_id", deserialize_with = "entity_id_or_default")]
    pub entity_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LinkedInMessageRequest {
    pub profile_id: String,
    pub content_prompt: String,
    pub access_token: String,
    #[serde(default = "default_entity_id", deserialize_with = "entity_id_or_default")]
    pub entity_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LinkedInPostRequest {
    pub content_prompt: String,
    pub access_token: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub article_url: Option<String>,
    #[serde(default = "default_entity_id", deserialize_with = "entity_id_or_default")]
    pub entity_id: String,
}

impl LinkedInPostRequest {
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if let Some(url) = &self.image_url {
            validate_http_url("image_url", url)?;
        }
        if let Some(url) = &self.article_url {
            validate_http_url("article_url", url)?;
        }
        Ok(())
    }
}

fn validate_http_url(field: &str, url: &str) -> Result<(), ApplicationError> {
    let rest = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host_and_path) if !host_and_path.is_empty() && !host_and_path.starts_with('/') => {
            Ok(())
        }
        _ => Err(ApplicationError::Validation(format!(
            "{field}: invalid or missing URL scheme: `{url}`"
        ))),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedInProfileInfo {
    pub id: String,
    pub name: String,
    pub headline: Option<String>,
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LinkedInResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LinkedInProfilesResponse {
    pub success: bool,
    pub message: String,
    pub profiles: Vec<LinkedInProfileInfo>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ActionsResponse {
    pub success: bool,
    pub message: String,
    pub actions: Vec<ActionInfo>,
    pub error: Option<String>,
}
