use outreach_agent::{GeminiClient, LlmClient};
use outreach_core::config::{AppConfig, LoadOptions};
use outreach_slack::{SlackApi, SlackWebClient};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::escape_json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Skipped, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass("config_validation", "configuration loaded and validated"));
            checks.push(check_broker_key(&config));
            checks.extend(check_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            for name in ["broker_api_key", "gemini_connectivity", "slack_connectivity"] {
                checks.push(DoctorCheck::skipped(name, "skipped because configuration did not load"));
            }
        }
    }

    // Skipped checks (no Slack token configured) do not fail the report.
    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_broker_key(config: &AppConfig) -> DoctorCheck {
    if config.broker.api_key.expose_secret().trim().is_empty() {
        DoctorCheck::fail("broker_api_key", "broker.api_key (COMPOSIO_API_KEY) is not set")
    } else {
        DoctorCheck::pass("broker_api_key", format!("key present for `{}`", config.broker.base_url))
    }
}

fn check_connectivity(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let details = format!("failed to initialize async runtime: {error}");
            return vec![
                DoctorCheck::fail("gemini_connectivity", details.clone()),
                DoctorCheck::fail("slack_connectivity", details),
            ];
        }
    };

    runtime.block_on(async { vec![check_gemini(config).await, check_slack(config).await] })
}

async fn check_gemini(config: &AppConfig) -> DoctorCheck {
    const NAME: &str = "gemini_connectivity";

    let client = match GeminiClient::new(&config.llm) {
        Ok(client) => client,
        Err(error) => return DoctorCheck::fail(NAME, format!("failed to build client: {error}")),
    };

    match client.list_models().await {
        Ok(models) if models.is_empty() => DoctorCheck::fail(NAME, "No models available from Google Gemini API"),
        Ok(models) => DoctorCheck::pass(
            NAME,
            format!("{} models visible; configured model `{}`", models.len(), client.model()),
        ),
        Err(error) => DoctorCheck::fail(NAME, format!("Error connecting to Google Gemini API: {error}")),
    }
}

async fn check_slack(config: &AppConfig) -> DoctorCheck {
    const NAME: &str = "slack_connectivity";

    let Some(token) = config.slack.bot_token.as_ref() else {
        return DoctorCheck::skipped(NAME, "SLACK_BOT_TOKEN is not set");
    };

    let client = match SlackWebClient::new(&config.slack) {
        Ok(client) => client,
        Err(error) => return DoctorCheck::fail(NAME, format!("failed to build client: {error}")),
    };

    match client.auth_test(token.expose_secret()).await {
        Ok(identity) if identity.ok => DoctorCheck::pass(
            NAME,
            format!(
                "authenticated as `{}` in team `{}`",
                identity.user.unwrap_or_default(),
                identity.team.unwrap_or_default()
            ),
        ),
        Ok(identity) => DoctorCheck::fail(
            NAME,
            format!("Slack API error: {}", identity.error.unwrap_or_else(|| "Unknown error".to_string())),
        ),
        Err(error) => DoctorCheck::fail(NAME, format!("Error connecting to Slack API: {error}")),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
