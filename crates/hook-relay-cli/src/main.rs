// hook-relay-cli/src/main.rs
// ============================================================================
// Module: Hook Relay CLI Entry Point
// Description: Command dispatcher for the Hook Relay webhook dispatcher.
// Purpose: Wire configuration, handlers, and transports into a runnable tool.
// Dependencies: clap, hook-relay-config, hook-relay-handlers, hook-relay-server, tokio
// ============================================================================

//! ## Overview
//! The CLI wires the default handler set into the pattern registry and runs
//! both webhook transports. Handler wiring lives here on purpose: the
//! routing core stays free of collaborator choices, and integrations swap
//! handlers by editing this wiring only.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use hook_relay_config::HookRelayConfig;
use hook_relay_core::Handler;
use hook_relay_core::PatternRegistry;
use hook_relay_core::RegistryBuilder;
use hook_relay_handlers::ForwardHandler;
use hook_relay_handlers::ForwardMode;
use hook_relay_handlers::LogHandler;
use hook_relay_providers::ChatRegistrationPlan;
use hook_relay_providers::github::GithubEventKind;
use hook_relay_providers::notion::NotionEventKind;
use hook_relay_server::WebhookServer;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "hook-relay", version, about = "Pattern-based webhook dispatcher")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start both webhook transports.
    Serve {
        /// Path to the configuration file.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print the registered routing key table.
    Routes {
        /// Path to the configuration file.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file and report the result.
    Check {
        /// Path to the configuration file.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            config,
        } => command_serve(config.as_deref()).await,
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Check {
                config,
            } => command_config_check(config.as_deref()),
        },
        Commands::Routes {
            config,
        } => command_routes(config.as_deref()),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let registry = Arc::new(build_registry(&config)?);
    report_chat_plan(&registry)?;
    let server = WebhookServer::new(config, Arc::clone(&registry));
    let running = server
        .start()
        .await
        .map_err(|err| CliError::new(format!("server start failed: {err}")))?;
    write_stderr_line(&format!(
        "hook-relay serving github on {} and notion on {}",
        running.github_addr, running.notion_addr
    ))
    .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
    running.join().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Reports the chat registration plan derived from the registry.
fn report_chat_plan(registry: &PatternRegistry) -> CliResult<()> {
    let plan = ChatRegistrationPlan::build(registry);
    for registration in &plan.registrations {
        write_stderr_line(&format!(
            "chat registration: {} {} ({})",
            registration.kind.as_str(),
            registration.trigger.flatten(),
            registration.key
        ))
        .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
    }
    for rejection in &plan.rejections {
        write_stderr_line(&format!(
            "chat registration skipped: {} ({})",
            rejection.key, rejection.reason
        ))
        .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes the `config check` command.
fn command_config_check(config_path: Option<&Path>) -> CliResult<ExitCode> {
    match load_config(config_path) {
        Ok(_) => {
            write_stdout_line("config ok")
                .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(emit_error(&err.to_string())),
    }
}

// ============================================================================
// SECTION: Routes Command
// ============================================================================

/// Executes the `routes` command.
fn command_routes(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let registry = build_registry(&config)?;
    for key in registry.keys() {
        write_stdout_line(&key)
            .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Loads configuration from an explicit path or the default lookup.
fn load_config(config_path: Option<&Path>) -> CliResult<HookRelayConfig> {
    let result = config_path
        .map_or_else(HookRelayConfig::load, HookRelayConfig::load_from_path);
    result.map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Builds the default handler registry.
///
/// Document page events feed the upstream indexer; code pushes and pull
/// requests are logged. Integrations change bindings here without touching
/// the routing core.
fn build_registry(config: &HookRelayConfig) -> CliResult<PatternRegistry> {
    let index: Arc<dyn Handler> = Arc::new(
        ForwardHandler::new(&config.upstream.base_url, ForwardMode::IndexDocument)
            .map_err(|err| CliError::new(format!("forward handler setup failed: {err}")))?,
    );
    let delete: Arc<dyn Handler> = Arc::new(
        ForwardHandler::new(&config.upstream.base_url, ForwardMode::DeleteDocument)
            .map_err(|err| CliError::new(format!("forward handler setup failed: {err}")))?,
    );
    let log: Arc<dyn Handler> = Arc::new(LogHandler::new(std::io::stderr()));
    Ok(RegistryBuilder::new()
        .register(NotionEventKind::PageCreated.routing_key(), Arc::clone(&index))
        .register(NotionEventKind::PageUpdated.routing_key(), index)
        .register(NotionEventKind::PageDeleted.routing_key(), delete)
        .register(GithubEventKind::Push.routing_key(), Arc::clone(&log))
        .register(GithubEventKind::PullRequest.routing_key(), log)
        .build())
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
