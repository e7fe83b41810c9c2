//! Startup helpers for the health assistant server.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AssistantConfig;
use crate::server::{self, AppState};
use crate::session::SessionSweeper;

/// How often idle sessions are purged.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the server until Ctrl+C.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting health assistant v{}", env!("CARGO_PKG_VERSION"));

    let state = match initialize() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = rt.block_on(async move {
        let sweeper = SessionSweeper::new(Arc::clone(&state.sessions), SWEEP_INTERVAL);
        let stop_sweeper = sweeper.shutdown_notifier();
        let sweeper_handle = sweeper.spawn();

        let result = server::run_server_with_shutdown(state, shutdown_signal()).await;

        stop_sweeper.notify_one();
        let _ = sweeper_handle.await;
        result
    });

    if let Err(e) = result {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Health assistant stopped");
    ExitCode::SUCCESS
}

/// Load configuration from the environment and build the application state.
///
/// # Errors
/// Returns an error if configuration or state creation fails.
pub fn initialize() -> Result<Arc<AppState>, Box<dyn std::error::Error + Send + Sync>> {
    let config = AssistantConfig::from_env()?;
    tracing::info!("Gemini endpoint: {}", config.gemini.endpoint());
    if config.session.default_api_key.is_some() {
        tracing::info!("New sessions start with the key from the environment");
    }

    AppState::new(config).map_err(|e| format!("Failed to create state: {e}").into())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Ctrl+C handler failed: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
