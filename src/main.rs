// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use sigops_dashboard::application::filter_defaults::{FilterDefaultsStore, MemoryDefaultsStore};
use sigops_dashboard::infrastructure::config::load_settings;
use sigops_dashboard::infrastructure::defaults_store::TomlDefaultsStore;
use sigops_dashboard::infrastructure::metrics_api::MetricsApi;
use sigops_dashboard::presentation::app_state::AppState;
use sigops_dashboard::presentation::build_router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings()?;

    // Metrics API client (infrastructure layer)
    let repository = Arc::new(MetricsApi::new(&settings.api.base_url, settings.api.timeout())?);

    let defaults_store: Arc<dyn FilterDefaultsStore> = match &settings.filters.defaults_path {
        Some(path) => Arc::new(TomlDefaultsStore::new(path)),
        None => Arc::new(MemoryDefaultsStore::default()),
    };

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let state = Arc::new(AppState::new(settings, repository, defaults_store));
    let router = build_router(state);

    tracing::info!("Starting sigops-dashboard on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
