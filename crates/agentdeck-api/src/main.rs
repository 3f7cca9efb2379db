// Agentdeck API server entry point
// Decision: Postgres store and the OpenAI-protocol client are built once here and injected

use agentdeck_api::auth::{AuthConfig, AuthState};
use agentdeck_api::config::ServerConfig;
use agentdeck_api::{build_router, AppState};
use agentdeck_core::{LlmClient, Store};
use agentdeck_openai::OpenAiClient;
use agentdeck_storage::{seed_builtin_tools, Database};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentdeck_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("agentdeck-api starting...");

    let config = ServerConfig::from_env()?;

    let db = Database::from_url(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");
    db.migrate().await?;

    if config.seed_builtin_tools {
        let seeded = seed_builtin_tools(&db)
            .await
            .context("Failed to seed built-in tools")?;
        tracing::info!(count = seeded, "Built-in tools seeded");
    }

    let llm = OpenAiClient::from_env().context("Failed to create LLM client")?;
    tracing::info!(base_url = %llm.config().base_url, "LLM client configured");

    let auth_config = AuthConfig::from_env();
    tracing::info!(mode = auth_config.mode.as_str(), "Authentication configured");

    if !config.api_prefix.is_empty() {
        tracing::info!(prefix = %config.api_prefix, "API prefix configured");
    }

    let store: Arc<dyn Store> = Arc::new(db.clone());
    let llm: Arc<dyn LlmClient> = Arc::new(llm);
    let state = AppState::new(store, llm, AuthState::new(auth_config));
    let app = build_router(state, &config.api_prefix);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Received shutdown signal");
}
