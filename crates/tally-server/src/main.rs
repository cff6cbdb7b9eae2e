//! tally server binary.
//!
//! Loads config (`.env`, optional YAML, environment), installs telemetry,
//! builds the one metrics registry, and serves until Ctrl-C / SIGTERM.

use tally_core::error::{Result, TallyError};
use tally_core::MetricsRegistry;
use tally_server::{app_state::AppState, config, obs, router};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = config::load()?;
    let registry = MetricsRegistry::new();
    let _telemetry = obs::init(&cfg, &registry)?;

    let listen = cfg.listen_addr();
    let environment = cfg.app.env.clone();
    let state = AppState::new(cfg, registry);
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen.as_str())
        .await
        .map_err(|e| TallyError::Internal(format!("failed to bind {listen}: {e}")))?;

    tracing::info!(module = "server", %listen, %environment, "🚀 Server running on http://{listen}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TallyError::Internal(format!("server failed: {e}")))?;

    tracing::info!(module = "server", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!(module = "server", "Shutting down server...");
}
