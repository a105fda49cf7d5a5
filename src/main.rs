use std::net::SocketAddr;
use std::sync::Arc;

use careers_ingest::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes,
    scraping::{adapters, HttpFetcher, PageFetcher},
    services::{ingest_service::IngestService, scheduler, scrape_orchestrator::ScrapeOrchestrator},
    storage::{JobStore, PgJobStore},
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,careers_ingest=debug")),
        )
        .init();
    init_config()?;
    let config = get_config()?;

    let pool = create_pool(config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(pool.clone()));
    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(config.fetch_timeout)?);

    let orchestrator = Arc::new(ScrapeOrchestrator::new(
        adapters::registry(fetcher),
        IngestService::new(store.clone()),
    ));
    info!(companies = ?orchestrator.companies(), "Registered site adapters");

    let mut scrape_scheduler = scheduler::start(orchestrator, config.scrape_interval).await?;

    let app = routes::router(AppState::new(store));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scrape_scheduler.shutdown().await?;
    pool.close().await;
    info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
