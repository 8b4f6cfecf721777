use std::sync::Arc;

use anyhow::Context;

use foodbank_stock::{ExpirationSweeper, StockConfig, StockEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    foodbank_observability::init();

    let config = StockConfig::from_env();
    let bind_addr = std::env::var("FOODBANK_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let engine = Arc::new(StockEngine::new(config));
    let sweeper = ExpirationSweeper::for_engine(&engine)
        .spawn(engine.clone())
        .context("failed to spawn expiration sweeper")?;

    let app = foodbank_api::app::build_app(engine);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    sweeper.shutdown();
    Ok(())
}
