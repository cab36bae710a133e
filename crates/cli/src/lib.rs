pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "outreach",
    about = "Outreach agents operator CLI",
    long_about = "Inspect configuration, check connectivity to Gemini and Slack, and smoke-test a running server.",
    after_help = "Examples:\n  outreach doctor --json\n  outreach config\n  outreach smoke --base-url http://127.0.0.1:8000"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and check Gemini, Slack, and broker readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run timed HTTP checks against a running server")]
    Smoke {
        #[arg(long, default_value = commands::smoke::DEFAULT_BASE_URL, help = "Server origin to test")]
        base_url: String,
        #[arg(long, default_value = "/api/v1", help = "API prefix the server mounts its routes under")]
        api_prefix: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Smoke { base_url, api_prefix } => commands::smoke::run(&base_url, &api_prefix),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
