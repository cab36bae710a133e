//! Request and response shapes shared by the HTTP surface and the channel
//! services.

pub mod connection;
pub mod email;
pub mod linkedin;
pub mod slack;
pub mod whatsapp;

use serde::{Deserialize, Deserializer};

/// Value interactive API explorers pre-fill into string fields.
pub const PLACEHOLDER_SECRET: &str = "string";

pub const DEFAULT_ENTITY_ID: &str = "default";

/// True when `value` can be forwarded as a credential.
pub fn is_usable_secret(value: Option<&str>) -> bool {
    match value {
        Some(secret) => !secret.trim().is_empty() && secret != PLACEHOLDER_SECRET,
        None => false,
    }
}

pub(crate) fn default_entity_id() -> String {
    DEFAULT_ENTITY_ID.to_string()
}

/// Reads an optional entity id; an explicit `null` means the default entity.
pub(crate) fn entity_id_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_entity_id))
}

/// Treats an explicit `null` like an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::is_usable_secret;

    #[test]
    fn placeholder_and_blank_secrets_are_unusable() {
        assert!(!is_usable_secret(None));
        assert!(!is_usable_secret(Some("")));
        assert!(!is_usable_secret(Some("   ")));
        assert!(!is_usable_secret(Some("string")));
        assert!(is_usable_secret(Some("xoxb-123")));
    }
}
