use std::sync::Arc;
use std::time::{Duration, Instant};

use outreach_agent::{LlmClient, MessageComposer};
use outreach_broker::{GmailService, IntegrationBroker, LinkedInService, SlackDispatchService, WhatsAppService};
use outreach_core::config::{AppConfig, PROJECT_NAME};
use outreach_core::CredentialCache;
use outreach_slack::{ChannelDirectory, SlackApi};
use secrecy::SecretString;

#[derive(Clone)]
pub struct AppState {
    pub service_name: &'static str,
    pub api_prefix: String,
    pub default_entity_id: String,
    pub started_at: Instant,
    pub composer: MessageComposer,
    pub slack_api: Arc<dyn SlackApi>,
    pub health_bot_token: Option<SecretString>,
    pub gmail: GmailService,
    pub slack: SlackDispatchService,
    pub channels: ChannelDirectory,
    pub linkedin: LinkedInService,
    pub whatsapp: WhatsAppService,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        llm: Arc<dyn LlmClient>,
        broker: Arc<dyn IntegrationBroker>,
        slack_api: Arc<dyn SlackApi>,
    ) -> Self {
        let ttl = Duration::from_secs(config.credentials.ttl_secs);
        let slack_tokens = Arc::new(CredentialCache::new(ttl));
        let linkedin_tokens = Arc::new(CredentialCache::new(ttl));
        let whatsapp_keys = Arc::new(CredentialCache::new(ttl));

        Self {
            service_name: PROJECT_NAME,
            api_prefix: config.api_prefix(),
            default_entity_id: config.broker.default_entity_id.clone(),
            started_at: Instant::now(),
            composer: MessageComposer::new(llm),
            slack_api: slack_api.clone(),
            health_bot_token: config.slack.bot_token.clone(),
            gmail: GmailService::new(broker.clone()),
            slack: SlackDispatchService::new(broker.clone(), slack_tokens.clone()),
            channels: ChannelDirectory::new(slack_api, slack_tokens),
            linkedin: LinkedInService::new(broker.clone(), linkedin_tokens),
            whatsapp: WhatsAppService::new(broker, whatsapp_keys),
        }
    }
}
