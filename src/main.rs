//! MQTT Authentication Gateway CLI
//!
//! Runs the session-caching authentication gateway until interrupted.
//!
//! The binary owns the gateway lifecycle only. It builds the [`AuthHook`] and
//! [`HookRegistry`] a broker embeds; lifecycle events reach the registry only
//! when a broker drives `on_connect_authenticate`, `on_acl_check` and
//! `HookRegistry::dispatch` from its own hook callbacks.

use anyhow::{Context, Result};
use clap::Parser;
use mqtt_auth_gateway::clock::SystemClock;
use mqtt_auth_gateway::hooks::{AuthHook, HookRegistry};
use mqtt_auth_gateway::notify::{NotifyListener, TracingNotifier};
use mqtt_auth_gateway::{AuthGateway, GatewayConfig, HttpVerifier};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Session-caching authentication gateway for MQTT brokers
#[derive(Parser, Debug)]
#[command(name = "mqtt-auth-gateway")]
#[command(version)]
#[command(about = "Authentication gateway for MQTT brokers", long_about = None)]
struct Args {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URL of the remote authentication service
    #[arg(long, env = "MQTT_AUTH_URL")]
    auth_url: Option<String>,

    /// Session time-to-live in seconds
    #[arg(long)]
    api_token_ttl: Option<u64>,

    /// Seconds between expired-session sweeps
    #[arg(long)]
    auto_clean_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON log format
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// File (or default) configuration with command-line overrides applied
    fn load_config(&self) -> Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration from file");
                GatewayConfig::from_file(path)?
            }
            None => GatewayConfig::default(),
        };

        if let Some(url) = &self.auth_url {
            config.auth.url = url.clone();
        }
        if let Some(ttl) = self.api_token_ttl {
            config.session.ttl_secs = ttl;
        }
        if let Some(interval) = self.auto_clean_interval {
            config.session.sweep_interval_secs = interval;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting MQTT authentication gateway"
    );

    let config = args.load_config()?;
    let verifier = HttpVerifier::new(&config.auth)?;
    info!(url = %verifier.url(), timeout_ms = config.auth.timeout_ms, "Remote verifier configured");

    let shutdown = CancellationToken::new();
    let gateway = Arc::new(AuthGateway::start(
        &config.session,
        Arc::new(verifier),
        Arc::new(SystemClock),
        shutdown.clone(),
    ));

    // Handed to an embedding broker; nothing dispatches through them here
    let auth_hook = AuthHook::new(gateway.clone(), config.hooks.acl_mode);
    let registry = HookRegistry::new();
    if config.hooks.notify {
        registry.register(Arc::new(NotifyListener::new(
            Arc::new(TracingNotifier),
            config.hooks.notify_payloads,
        )));
    }

    info!(
        hook = %auth_hook.id(),
        acl_mode = ?auth_hook.acl_mode(),
        notify = config.hooks.notify,
        "Gateway ready"
    );

    wait_for_signal().await;
    warn!("Caught signal, stopping...");

    shutdown.cancel();
    gateway.shutdown().await;
    info!(sessions = gateway.cache().len(), "Shutdown complete");

    Ok(())
}

/// Resolve on SIGINT or SIGTERM
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
