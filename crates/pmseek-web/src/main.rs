//! pmseek web server
//!
//! Run with: cargo run -p pmseek-web

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pmseek_web::config::Config;
use pmseek_web::router::build_router;
use pmseek_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pmseek=debug,info")),
        )
        .init();

    info!("Starting pmseek {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    if config.pubmed.api_key.is_none() {
        warn!("NCBI_API_KEY not set; PubMed calls are paced for the 3 req/s anonymous limit.");
    }

    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
