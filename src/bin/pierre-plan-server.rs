// ABOUTME: HTTP server binary for the Pierre workout plan service
// ABOUTME: Loads configuration, migrates the database, builds the provider and serves the router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Pierre Plan Server Binary
//!
//! Serves plan generation over HTTP until ctrl-c.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pierre_plan_server::{
    config::ServerConfig, database::PlanDatabase, logging, resources::ServerResources,
    routes::build_router,
};
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "pierre-plan-server")]
#[command(about = "Pierre Plan Server - AI-assisted workout plan generation")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    logging::init_from_env()?;
    info!("Starting Pierre Plan Server");
    config.log_summary();

    let database = PlanDatabase::new(&config.database_url).await?;
    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::from_config(config, database)?);
    let app = build_router(resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{addr}");
    info!("   Create plan:  POST http://{addr}/api/plans");
    info!("   Preview:      POST http://{addr}/api/plans/preview");
    info!("   Health:       GET  http://{addr}/health");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
