// ABOUTME: HTTP server binary for the FitPlan wellness API
// ABOUTME: Loads configuration, opens the database, and serves the router until a shutdown signal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # FitPlan Server Binary
//!
//! ```bash
//! GEMINI_API_KEY=... fitplan-server --port 8081 --database-url sqlite:./data/fitplan.db
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fitplan_server::config::ServerConfig;
use fitplan_server::database::Database;
use fitplan_server::logging;
use fitplan_server::resources::ServerResources;
use fitplan_server::routes::build_router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fitplan-server")]
#[command(about = "FitPlan API - assessments, posture analysis, AI plans, and weekly checklists")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    let address = format!("{}:{}", config.host, config.http_port);
    let resources = Arc::new(ServerResources::from_config(database, config)?);
    let app = build_router(resources);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(%address, "FitPlan server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "Server terminated with an error");
        return Err(e.into());
    }

    info!("FitPlan server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
