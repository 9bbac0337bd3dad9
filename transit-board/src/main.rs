use std::error::Error;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transit_board::catalog::Catalog;
use transit_board::config::{AppConfig, FeedSettings};
use transit_board::feed::{FeedClient, FeedSource, MockFeedSource};
use transit_board::service::{TransitService, run_background_refresh};
use transit_board::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().inspect_err(|e| error!(error = %e, "bad configuration"))?;

    // Fail fast if the static schedule is missing or inconsistent
    let catalog = Catalog::load(&config.static_dir).inspect_err(
        |e| error!(error = %e, dir = %config.static_dir.display(), "failed to load catalog"),
    )?;
    let catalog = Arc::new(catalog);

    match config.feeds.clone() {
        FeedSettings::Live(feed_config) => {
            info!(feeds = feed_config.endpoints.len(), "using live feeds");
            let client = FeedClient::new(feed_config)?;
            serve(config, catalog, client).await
        }
        FeedSettings::Mock(dir) => {
            info!(dir = %dir.display(), "using recorded feeds");
            let mock = MockFeedSource::from_dir(&dir)?;
            serve(config, catalog, mock).await
        }
    }
}

async fn serve<S: FeedSource + 'static>(
    config: AppConfig,
    catalog: Arc<Catalog>,
    source: S,
) -> Result<(), Box<dyn Error>> {
    let service = Arc::new(TransitService::new(
        catalog,
        source,
        config.refresh_interval,
    ));

    // Keep the snapshot warm between queries
    tokio::spawn(run_background_refresh(
        Arc::clone(&service),
        config.refresh_interval,
    ));

    let app = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "transit board listening");
    info!("  GET /health");
    info!("  GET /api/stations");
    info!("  GET /api/stations/lookup?name=");
    info!("  GET /api/stations/:id/arrivals?n=");
    info!("  GET /api/arrivals?station=&n=");
    info!("  GET /api/stops/:id/arrivals?n=");

    axum::serve(listener, app).await?;
    Ok(())
}
