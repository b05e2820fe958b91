//! hr-gateway: ElevateHR USSD Gateway Main Binary
//!
//! Main entry point for the ElevateHR USSD self-service gateway.
//!
//! Usage:
//!   hr-gateway           - Start the webhook server
//!   hr-gateway --help    - Show help

mod rate_limit;
mod sweep;
mod webhook;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use hr_core::{
    Config, DialogRegistry, LogNotifier, MemoryRecords, Notifier, Repositories, SessionStore,
    SqliteRecords, StaticDirectory, UssdRouter,
};
use hr_dialogs::register_default_dialogs;
use hr_sms::{SmsClient, SmsNotifier};

use rate_limit::RateLimiter;
use webhook::WebhookServer;

/// Run mode
enum RunMode {
    /// Webhook server mode
    Server,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args() {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("hr-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting hr-gateway...");

    run_server(config).await
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    let args: Vec<String> = std::env::args().collect();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("hr-gateway - ElevateHR USSD Gateway");
    println!();
    println!("Usage:");
    println!("  hr-gateway           Start the webhook server");
    println!("  hr-gateway --help    Show this help message");
    println!("  hr-gateway --version Show version");
    println!();
    println!("Environment Variables:");
    println!("  USSD_PORT              Webhook HTTP port (default: 8000)");
    println!("  HR_EMPLOYEES           Roster as ID:Name,ID:Name pairs");
    println!("  HR_DB_PATH             SQLite database path (in-memory when unset)");
    println!("  SESSION_TIMEOUT_SECS   Session expiry from creation (default: 300)");
    println!("  MAX_ATTEMPTS           Invalid input strikes before hangup (default: 3)");
    println!("  SESSION_RETENTION_SECS Idle session retention for the sweep (default: 3600)");
    println!("  SWEEP_INTERVAL_SECS    Sweep period (default: 60)");
    println!("  AT_USERNAME            Africa's Talking username");
    println!("  AT_API_KEY             Africa's Talking API key");
    println!("  AT_SANDBOX             Use the sandbox SMS endpoint (default: true)");
    println!("  DOCS_BASE_URL          Base URL for document download links");
}

/// Run the webhook server with the periodic session sweep
async fn run_server(config: Config) -> anyhow::Result<()> {
    // Record repositories: SQLite when a path is configured, in-memory otherwise
    let repos = match &config.db_path {
        Some(path) => {
            tracing::info!("Using SQLite records at {}", path);
            let backend = SqliteRecords::new(path)
                .map_err(|e| anyhow::anyhow!("Failed to open record database: {}", e))?;
            Repositories::from_backend(Arc::new(backend))
        }
        None => {
            tracing::info!("No HR_DB_PATH set, using in-memory records");
            Repositories::from_backend(Arc::new(MemoryRecords::new()))
        }
    };

    // Employee roster
    let directory = Arc::new(StaticDirectory::new(config.employees.clone()));
    if directory.is_empty() {
        tracing::warn!("Employee roster is empty; no caller can authenticate");
    } else {
        tracing::info!("Loaded {} employee(s)", directory.len());
    }

    // Dialog registry
    let mut registry = DialogRegistry::new();
    register_default_dialogs(&mut registry, &repos, &config.docs_base_url);
    tracing::info!("Registered {} dialog(s)", registry.len());

    // Notifier: real SMS when credentials are present, log-only otherwise
    let notifier: Arc<dyn Notifier> = match (&config.sms.username, &config.sms.api_key) {
        (Some(username), Some(api_key)) => {
            tracing::info!("SMS delivery enabled (sandbox: {})", config.sms.sandbox);
            let client = SmsClient::new(username.clone(), api_key.clone(), config.sms.sandbox);
            Arc::new(SmsNotifier::new(Arc::new(client)))
        }
        _ => {
            tracing::info!("SMS credentials not set, notifications will be logged only");
            Arc::new(LogNotifier)
        }
    };

    let store = Arc::new(SessionStore::new());
    let router = Arc::new(UssdRouter::new(
        Arc::clone(&store),
        registry,
        directory,
        notifier,
        config.session.clone(),
    ));

    let rate_limiter = Arc::new(RateLimiter::new());

    // Periodic sweep of abandoned sessions and stale rate-limit windows
    let sweep_handle = sweep::start_sweep(
        store,
        Arc::clone(&rate_limiter),
        Duration::from_secs(config.session.retention_secs),
        Duration::from_secs(config.session.sweep_interval_secs),
    );

    // Webhook server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let server = WebhookServer::new(addr, router, rate_limiter);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.start().await {
            tracing::error!("Webhook server error: {}", e);
        }
    });

    tracing::info!("hr-gateway initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    server_handle.abort();
    sweep_handle.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
