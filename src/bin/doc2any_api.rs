//! HTTP API binary for doc2any.
//!
//! Serves the axum router from `doc2any::server` over the conversion
//! backend resolved from the environment.

use anyhow::{Context, Result};
use clap::Parser;
use doc2any::resolve_converter;
use doc2any::server::{create_router, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Document conversion HTTP API.
#[derive(Parser, Debug)]
#[command(name = "doc2any-api", version, about = "Document conversion HTTP API")]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, env = "DOC2ANY_PORT", default_value_t = 8000)]
    port: u16,

    /// Conversion backend endpoint.
    #[arg(long, env = "DOC2ANY_BACKEND_URL")]
    backend_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,doc2any=debug,tower_http=debug")),
        )
        .init();

    let converter =
        resolve_converter(cli.backend_url.as_deref()).context("Failed to set up backend")?;
    let router = create_router(AppState { converter });

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!(port = cli.port, "Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, router).await?;

    Ok(())
}
