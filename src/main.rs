mod config;
mod elastic;
mod language;
mod ranker;
mod suggest;
mod tools;

pub const USER_AGENT: &str = concat!("qarank/", env!("CARGO_PKG_VERSION"), " (MCP Server)");

use config::Config;
use rmcp::{ServiceExt, transport::stdio};
use tools::QaRank;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("qarank=info".parse()?),
        )
        .init();

    info!("starting qarank MCP server");

    let config = Config::from_env().inspect_err(|e| tracing::error!("invalid configuration: {e}"))?;

    let service = QaRank::new(&config)
        .await?
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("failed to start server: {e}"))?;

    service.waiting().await?;
    info!("server stopped");
    Ok(())
}
