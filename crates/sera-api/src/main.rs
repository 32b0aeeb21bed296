//! Sera relay entry point.
//!
//! Binary name: `sera`
//!
//! Loads configuration (file, `.env`, environment, flags), then either
//! starts the HTTP relay or prints the resolved configuration.

mod cli;
mod http;
mod state;

use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use sera_infra::config::{apply_env_overrides, load_config, resolve_api_key};
use sera_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_directive};
use sera_types::config::RelayConfig;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` first so clap's `env` attributes and the overrides below see it
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    init_tracing(verbosity_directive(cli.verbose, cli.quiet), otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let mut config = load_config(&cli.config).await?;
    apply_env_overrides(&mut config)?;

    let result = match cli.command {
        Commands::Serve { host, port, .. } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Commands::CheckConfig => check_config(&config),
    };

    shutdown_tracing();
    result
}

async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let state = AppState::init(&config, resolve_api_key()).await?;

    let cancel = CancellationToken::new();
    let sweeper = (config.store.idle_ttl_secs > 0).then(|| {
        let interval = Duration::from_secs(config.store.sweep_interval_secs.max(1));
        state.store.spawn_sweeper(interval, cancel.clone())
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        model = %config.upstream.model,
        max_attempts = config.retry.max_attempts,
        "relay listening"
    );

    println!(
        "  {} Sera relay listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state, &config.cors);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }
    println!("\n  Server stopped.");
    Ok(())
}

fn check_config(config: &RelayConfig) -> anyhow::Result<()> {
    let has_key = resolve_api_key().is_some();

    let mut value = serde_json::to_value(config)?;
    value["upstream"]["api_key"] = if has_key {
        serde_json::Value::from("<redacted>")
    } else {
        serde_json::Value::Null
    };
    println!("{}", serde_json::to_string_pretty(&value)?);

    if has_key {
        eprintln!("  {} upstream API key found", console::style("✓").green());
    } else {
        eprintln!(
            "  {} no upstream API key (set GEMINI_API_KEY)",
            console::style("✗").red()
        );
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    tracing::info!("shutdown signal received");
}
