use anyhow::Context;
use tokio::fs;
use tokio::net::TcpListener;
use tracing::info;

use buoyspec::{FrequencyTable, MemoryStore, SpectrumStore, Station};

use crate::models::config::ServiceConfig;

pub const DEFAULT_CONFIG_PATH: &str = "buoyspec.json";

pub fn config_path() -> String {
    std::env::var("BUOYSPEC_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub async fn load_config(file_path: &str) -> anyhow::Result<ServiceConfig> {
    let data = fs::read_to_string(file_path)
        .await
        .with_context(|| format!("reading config {file_path}"))?;

    let config: ServiceConfig =
        serde_json::from_str(&data).with_context(|| format!("parsing config {file_path}"))?;

    info!(
        "Config loaded from {}: {} stations",
        file_path,
        config.stations.len()
    );
    Ok(config)
}

pub async fn load_frequency_table(file_path: &str) -> anyhow::Result<FrequencyTable> {
    let data = fs::read_to_string(file_path)
        .await
        .with_context(|| format!("reading frequency table {file_path}"))?;

    let table = FrequencyTable::parse(&data)
        .with_context(|| format!("parsing frequency table {file_path}"))?;

    info!("Frequency table loaded: {} bins", table.len());
    Ok(table)
}

/// Resume from the snapshot when one exists, then make sure every configured
/// station is registered.
pub fn open_store(config: &ServiceConfig) -> anyhow::Result<MemoryStore> {
    let store = match &config.snapshot_path {
        Some(path) if std::path::Path::new(path).exists() => MemoryStore::load_snapshot(path)
            .with_context(|| format!("loading snapshot {path}"))?,
        _ => MemoryStore::new(),
    };

    for station in &config.stations {
        if store.register_station(Station::from(station))? {
            info!("Registered station {} ({})", station.code, station.name);
        }
    }

    Ok(store)
}

/// Bind the listener and write the actual port back into the config, so a
/// configured port of 0 reports the one the OS picked.
pub async fn bind(config: &mut ServiceConfig) -> anyhow::Result<TcpListener> {
    let bind_addr = format!("{}:{}", config.connection.ip, config.connection.port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;

    let actual_port = listener.local_addr().context("reading bound address")?.port();
    config.connection.port = actual_port;

    info!("Listener bound on port {}", actual_port);
    Ok(listener)
}
