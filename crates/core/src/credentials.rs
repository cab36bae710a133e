//! Short-lived credential cache.
//!
//! Callers may pass a platform token once and omit it on follow-up requests:
//! the Slack channel list remembers the bot token per channel, LinkedIn calls
//! remember the access token per entity, and WhatsApp sends remember the API
//! key per phone number. Entries expire after the configured TTL.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

use crate::domain::is_usable_secret;

pub const DEFAULT_CREDENTIAL_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CachedCredential {
    secret: SecretString,
    expires_at: DateTime<Utc>,
}

pub struct CredentialCache {
    ttl: chrono::Duration,
    entries: RwLock<HashMap<String, CachedCredential>>,
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIAL_TTL)
    }
}

impl CredentialCache {
    pub fn new(ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(1));
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    /// Remembers `secret` for `key`. Blank keys and placeholder secrets are ignored.
    pub async fn store(&self, key: &str, secret: &str) -> bool {
        if key.trim().is_empty() || !is_usable_secret(Some(secret)) {
            return false;
        }

        let entry = CachedCredential {
            secret: SecretString::from(secret.to_string()),
            expires_at: Utc::now() + self.ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        true
    }

    /// Returns the live secret for `key`, evicting it once expired.
    pub async fn get(&self, key: &str) -> Option<String> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.expires_at > Utc::now() => {
                    return Some(entry.secret.expose_secret().to_string());
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.expires_at <= Utc::now()) {
            entries.remove(key);
        }
        None
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
