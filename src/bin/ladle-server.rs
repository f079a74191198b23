// ABOUTME: Ladle server binary: config, logging, database and HTTP serve loop
// ABOUTME: CLI flags override environment configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use anyhow::Result;
use clap::Parser;
use ladle::config::ServerConfig;
use ladle::database::Database;
use ladle::server::{self, ServerResources};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Ladle recipe service
#[derive(Debug, Parser)]
#[command(name = "ladle-server", version, about)]
struct Args {
    /// Port to listen on (overrides HTTP_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Database URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    let database = Database::new(&config.database_url).await?;
    let resources = Arc::new(ServerResources::new(database, config));

    server::serve(resources).await?;
    Ok(())
}
