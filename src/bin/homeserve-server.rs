// ABOUTME: Production server binary for the HomeServe booking marketplace
// ABOUTME: Loads configuration, opens the database, and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use homeserve_server::{
    auth::AuthManager, config::environment::ServerConfig, database::Database, logging, routes,
    routes::ServerResources,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "homeserve-server")]
#[command(about = "HomeServe - booking marketplace backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting HomeServe server");
    info!("{}", config.summary());

    let database = Arc::new(Database::new(&config.database_url).await?);
    database.migrate().await?;
    info!("Database ready at {}", config.database_url);

    let auth = AuthManager::new(&config.jwt_secret);
    let resources = Arc::new(ServerResources::new(database, auth));
    let app = routes::router(resources);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
