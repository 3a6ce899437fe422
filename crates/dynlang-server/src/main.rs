//! Binary entrypoint for the dynlang HTTP server.
//!
//! Configuration comes from `DYNLANG_*` environment variables (see
//! [`ServerConfig`]); log filtering from `RUST_LOG`.

use dynlang_server::config::ServerConfig;
use dynlang_server::router::build_router;
use dynlang_server::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.listen_addr();
    let state = AppState::new(config)?;
    let app = build_router(state);

    tracing::info!("dynlang server starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
