use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use buoyspec::{DirectionGrid, FrequencyTable, IngestReport, MemoryStore};

use crate::client::fetch::StationFetcher;
use crate::models::config::ServiceConfig;

/// Outcome of the latest ingestion run of one station.
#[derive(Clone, Debug, Serialize)]
pub struct StationStatus {
    pub station: String,
    pub finished_at: DateTime<Utc>,
    pub report: Option<IngestReport>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub store: Arc<MemoryStore>,
    pub table: Arc<FrequencyTable>,
    pub grid: Arc<DirectionGrid>,
    pub fetcher: Arc<StationFetcher>,
    // station code -> last run outcome
    pub status: Arc<RwLock<HashMap<String, StationStatus>>>,
    // held for the duration of an ingestion run
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        store: MemoryStore,
        table: FrequencyTable,
        grid: DirectionGrid,
    ) -> Self {
        let fetcher = StationFetcher::new(config.source.clone());
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            table: Arc::new(table),
            grid: Arc::new(grid),
            fetcher: Arc::new(fetcher),
            status: Arc::new(RwLock::new(HashMap::new())),
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}
