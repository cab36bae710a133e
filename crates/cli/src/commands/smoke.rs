use std::time::{Duration, Instant};

use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{json, Value};

use crate::commands::{elapsed_ms, escape_json, CommandResult};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

/// One HTTP probe: what to call and how to judge the JSON it returns.
struct Probe {
    name: &'static str,
    method: Method,
    path: String,
    body: Option<Value>,
    verdict: fn(&Value) -> Result<String, String>,
}

pub fn run(base_url: &str, api_prefix: &str) -> CommandResult {
    let started = Instant::now();
    let base = base_url.trim_end_matches('/');
    let prefix = normalize_prefix(api_prefix);

    let client = match Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(error) => {
            let check = SmokeCheck {
                name: "http_client",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to build HTTP client: {error}"),
            };
            return finalize_report(vec![check], elapsed_ms(started));
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let check = SmokeCheck {
                name: "async_runtime",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            };
            return finalize_report(vec![check], elapsed_ms(started));
        }
    };

    let mut checks = Vec::new();
    let mut reachable = true;
    for probe in probes(&prefix) {
        if !reachable {
            checks.push(skipped(probe.name));
            continue;
        }
        let check = runtime.block_on(execute(&client, base, probe));
        // An unreachable liveness endpoint makes the remaining probes meaningless.
        reachable = !(check.name == "liveness" && check.status == SmokeStatus::Fail);
        checks.push(check);
    }

    finalize_report(checks, elapsed_ms(started))
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn probes(prefix: &str) -> Vec<Probe> {
    vec![
        Probe {
            name: "liveness",
            method: Method::GET,
            path: "/health".to_string(),
            body: None,
            verdict: |body| match body["status"].as_str() {
                Some("healthy") => Ok("server reports healthy".to_string()),
                other => Err(format!("unexpected status {other:?}")),
            },
        },
        Probe {
            name: "detailed_health",
            method: Method::GET,
            path: format!("{prefix}/health/detailed"),
            body: None,
            verdict: |body| match body["status"].as_str() {
                Some("healthy") => Ok(format!(
                    "gemini {}, slack {}",
                    body["api_connections"]["gemini"]["status"].as_str().unwrap_or("unknown"),
                    body["api_connections"]["slack"]["status"].as_str().unwrap_or("unknown")
                )),
                Some(status) => Err(format!(
                    "server is {status}: {}",
                    body["api_connections"]["gemini"]["details"]["error"].as_str().unwrap_or("no details")
                )),
                None => Err("response carried no status".to_string()),
            },
        },
        Probe {
            name: "email_generation",
            method: Method::POST,
            path: format!("{prefix}/gmail/generate"),
            body: Some(json!({
                "recipient_email": "smoke-test@example.com",
                "subject": "Smoke test",
                "content_prompt": "Write a one-sentence note confirming the outreach service is up.",
                "is_formal": true,
            })),
            verdict: |body| {
                if body["success"].as_bool() == Some(true) {
                    let chars = body["email_content"].as_str().map(str::len).unwrap_or(0);
                    Ok(format!("generated {chars} characters"))
                } else {
                    Err(body["error"].as_str().unwrap_or("generation failed").to_string())
                }
            },
        },
    ]
}

async fn execute(client: &Client, base: &str, probe: Probe) -> SmokeCheck {
    let started = Instant::now();
    let url = format!("{base}{}", probe.path);

    let mut request = client.request(probe.method, &url);
    if let Some(body) = &probe.body {
        request = request.json(body);
    }

    let outcome = match request.send().await {
        Ok(response) => {
            let status = response.status();
            match response.json::<Value>().await {
                Ok(body) if status.is_success() => (probe.verdict)(&body),
                Ok(body) => Err(format!("HTTP {}: {}", status.as_u16(), body["detail"].as_str().unwrap_or(""))),
                Err(error) => Err(format!("HTTP {}: invalid JSON body: {error}", status.as_u16())),
            }
        }
        Err(error) => Err(format!("request to {url} failed: {error}")),
    };

    let (status, message) = match outcome {
        Ok(message) => (SmokeStatus::Pass, message),
        Err(message) => (SmokeStatus::Fail, message),
    };
    SmokeCheck { name: probe.name, status, elapsed_ms: elapsed_ms(started), message }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status != SmokeStatus::Pass);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            escape_json(&error.to_string())
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
