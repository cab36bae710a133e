use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::is_usable_secret;

pub const PROJECT_NAME: &str = "Outreach AI Agents API";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub broker: BrokerConfig,
    pub slack: SlackConfig,
    pub credentials: CredentialsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub api_prefix: String,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub timeout_secs: u64,
    pub default_entity_id: String,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub bot_token: Option<SecretString>,
    pub api_base_url: String,
}

#[derive(Clone, Debug)]
pub struct CredentialsConfig {
    pub ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub broker_api_key: Option<String>,
    pub broker_base_url: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_api_base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
                api_prefix: "/api/v1".to_string(),
                graceful_shutdown_secs: 15,
            },
            llm: LlmConfig {
                api_key: String::new().into(),
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-1.5-pro".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            broker: BrokerConfig {
                api_key: String::new().into(),
                base_url: "https://backend.composio.dev/api".to_string(),
                timeout_secs: 30,
                default_entity_id: "default".to_string(),
            },
            slack: SlackConfig { bot_token: None, api_base_url: "https://slack.com/api".to_string() },
            credentials: CredentialsConfig { ttl_secs: 24 * 60 * 60 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("outreach.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Route prefix with a leading slash and no trailing slash.
    pub fn api_prefix(&self) -> String {
        let trimmed = self.server.api_prefix.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return String::new();
        }
        if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(api_prefix) = server.api_prefix {
                self.server.api_prefix = api_prefix;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = secret_value(llm_api_key_value);
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(broker) = patch.broker {
            if let Some(broker_api_key_value) = broker.api_key {
                self.broker.api_key = secret_value(broker_api_key_value);
            }
            if let Some(base_url) = broker.base_url {
                self.broker.base_url = base_url;
            }
            if let Some(timeout_secs) = broker.timeout_secs {
                self.broker.timeout_secs = timeout_secs;
            }
            if let Some(default_entity_id) = broker.default_entity_id {
                self.broker.default_entity_id = default_entity_id;
            }
        }

        if let Some(slack) = patch.slack {
            if let Some(slack_bot_token_value) = slack.bot_token {
                self.slack.bot_token = Some(secret_value(slack_bot_token_value));
            }
            if let Some(api_base_url) = slack.api_base_url {
                self.slack.api_base_url = api_base_url;
            }
        }

        if let Some(credentials) = patch.credentials {
            if let Some(ttl_secs) = credentials.ttl_secs {
                self.credentials.ttl_secs = ttl_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("OUTREACH_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("OUTREACH_SERVER_PORT") {
            self.server.port = parse_u16("OUTREACH_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("PORT") {
            self.server.port = parse_u16("PORT", &value)?;
        }
        if let Some(value) = read_env("OUTREACH_SERVER_API_PREFIX") {
            self.server.api_prefix = value;
        }
        if let Some(value) = read_env("OUTREACH_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("OUTREACH_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let llm_api_key = read_env("OUTREACH_LLM_API_KEY").or_else(|| read_env("GEMINI_API_KEY"));
        if let Some(value) = llm_api_key {
            self.llm.api_key = secret_value(value);
        }
        if let Some(value) = read_env("OUTREACH_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("OUTREACH_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("OUTREACH_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("OUTREACH_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("OUTREACH_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("OUTREACH_LLM_MAX_RETRIES", &value)?;
        }

        let broker_api_key =
            read_env("OUTREACH_BROKER_API_KEY").or_else(|| read_env("COMPOSIO_API_KEY"));
        if let Some(value) = broker_api_key {
            self.broker.api_key = secret_value(value);
        }
        if let Some(value) = read_env("OUTREACH_BROKER_BASE_URL") {
            self.broker.base_url = value;
        }
        if let Some(value) = read_env("OUTREACH_BROKER_TIMEOUT_SECS") {
            self.broker.timeout_secs = parse_u64("OUTREACH_BROKER_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("OUTREACH_BROKER_DEFAULT_ENTITY_ID") {
            self.broker.default_entity_id = value;
        }

        let slack_bot_token =
            read_env("OUTREACH_SLACK_BOT_TOKEN").or_else(|| read_env("SLACK_BOT_TOKEN"));
        if let Some(value) = slack_bot_token {
            self.slack.bot_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("OUTREACH_SLACK_API_BASE_URL") {
            self.slack.api_base_url = value;
        }

        if let Some(value) = read_env("OUTREACH_CREDENTIALS_TTL_SECS") {
            self.credentials.ttl_secs = parse_u64("OUTREACH_CREDENTIALS_TTL_SECS", &value)?;
        }

        let log_level =
            read_env("OUTREACH_LOGGING_LEVEL").or_else(|| read_env("OUTREACH_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        if let Some(value) = read_env("DEBUG") {
            if parse_debug_flag(&value) {
                self.logging.level = "debug".to_string();
            }
        }
        let log_format =
            read_env("OUTREACH_LOGGING_FORMAT").or_else(|| read_env("OUTREACH_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = secret_value(llm_api_key);
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(broker_api_key) = overrides.broker_api_key {
            self.broker.api_key = secret_value(broker_api_key);
        }
        if let Some(broker_base_url) = overrides.broker_base_url {
            self.broker.base_url = broker_base_url;
        }
        if let Some(slack_bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = Some(secret_value(slack_bot_token));
        }
        if let Some(slack_api_base_url) = overrides.slack_api_base_url {
            self.slack.api_base_url = slack_api_base_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api_keys(&self.llm, &self.broker)?;
        validate_server(&self.server)?;
        validate_llm(&self.llm)?;
        validate_broker(&self.broker)?;
        validate_slack(&self.slack)?;
        validate_credentials(&self.credentials)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("outreach.toml"), PathBuf::from("config/outreach.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_api_keys(llm: &LlmConfig, broker: &BrokerConfig) -> Result<(), ConfigError> {
    let llm_missing = llm.api_key.expose_secret().trim().is_empty();
    let broker_missing = broker.api_key.expose_secret().trim().is_empty();

    if llm_missing || broker_missing {
        return Err(ConfigError::Validation(
            "llm.api_key (GEMINI_API_KEY) and broker.api_key (COMPOSIO_API_KEY) are required. \
             Set them in outreach.toml or the environment"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    validate_http_url("llm.base_url", &llm.base_url)
}

fn validate_broker(broker: &BrokerConfig) -> Result<(), ConfigError> {
    if broker.timeout_secs == 0 || broker.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "broker.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if broker.default_entity_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "broker.default_entity_id must not be empty".to_string(),
        ));
    }

    validate_http_url("broker.base_url", &broker.base_url)
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    // Any token kind is accepted; it only backs the Slack health probe.
    if let Some(bot_token) = &slack.bot_token {
        if !is_usable_secret(Some(bot_token.expose_secret())) {
            return Err(ConfigError::Validation(
                "slack.bot_token must not be blank or a placeholder when set".to_string(),
            ));
        }
    }

    validate_http_url("slack.api_base_url", &slack.api_base_url)
}

fn validate_credentials(credentials: &CredentialsConfig) -> Result<(), ConfigError> {
    if credentials.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "credentials.ttl_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }

    Ok(())
}

/// Value of `key` when set to something other than blank; unset and blank read the same.
pub fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

pub fn parse_debug_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "t")
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    llm: Option<LlmPatch>,
    broker: Option<BrokerPatch>,
    slack: Option<SlackPatch>,
    credentials: Option<CredentialsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    api_prefix: Option<String>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct BrokerPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    default_entity_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    bot_token: Option<String>,
    api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CredentialsPatch {
    ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
