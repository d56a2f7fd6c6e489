use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use docqa_cli::{http, logging};
use docqa_core::config::Config;
use docqa_engine::RagService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let settings = Config::load()?.settings()?;
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("server.host/server.port do not form a socket address")?;

    let service = Arc::new(RagService::from_settings(settings)?);
    let app = http::router(service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "docqa server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
