use axum::Router;
use tracing::{info, Level};

mod client;
mod models;
mod routes;
mod state;
mod utils;

use buoyspec::DirectionGrid;

use crate::state::app_state::AppState;
use crate::utils::conf_helper::{bind, config_path, load_config, load_frequency_table, open_store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    // === CONFIG ===
    let mut config = load_config(&config_path()).await?;
    let table = load_frequency_table(&config.frequency_table).await?;
    let grid = DirectionGrid::new(config.direction_step_deg)?;
    let store = open_store(&config)?;

    // === LISTENER ===
    let listener = bind(&mut config).await?;
    info!(
        "Server initialized on {}:{}",
        config.connection.ip, config.connection.port
    );

    let state = AppState::new(config, store, table, grid);

    let initial = state.clone();
    tokio::spawn(async move {
        crate::client::runner::run_once(&initial).await;
    });

    if let Some(interval) = state.config.refresh_interval_secs.filter(|&s| s > 0) {
        let worker = state.clone();
        tokio::spawn(async move {
            crate::client::runner::start_refresh_loop(worker, interval).await;
        });
    }

    let app = Router::new()
        .merge(routes::info_routes::health_routes(state.clone()))
        .merge(routes::data_routes::data_routes(state));

    axum::serve(listener, app).await?;
    Ok(())
}
