use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use buoyspec::core::constants::FREQUENCY_LABEL_TOLERANCE;
use buoyspec::{BuoyError, SpectrumStore, StoreCounts, TimeStepId};

use crate::client::runner::run_once;
use crate::state::app_state::{AppState, StationStatus};

/// Row of GET /stations/{code}/timesteps
#[derive(Serialize)]
pub struct TimeStepSummary {
    pub id: TimeStepId,
    pub timestamp: DateTime<Utc>,
    pub spectra_ingested: bool,
    pub separation_frequency: Option<f64>,
    pub hm0: Option<f64>,
    pub te: Option<f64>,
    pub power: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct StationsQuery {
    /// Include stations that have no ingested spectra yet
    #[serde(default)]
    pub all: bool,
}

#[derive(Deserialize, Debug)]
pub struct DirectionalQuery {
    pub frequency: f64,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub counts: StoreCounts,
    pub stations: Vec<StationStatus>,
}

/// =======================
/// ROUTER
/// =======================

pub fn data_routes(state: AppState) -> Router {
    Router::new()
        .route("/stations", get(list_stations))
        .route("/stations/{code}/timesteps", get(station_timesteps))
        .route("/timesteps/{id}", get(time_step))
        .route("/timesteps/{id}/spectrum", get(time_step_spectrum))
        .route("/timesteps/{id}/directional", get(time_step_directional))
        .route("/status", get(status))
        .route("/ingest", post(trigger_ingest))
        .with_state(state)
}

fn store_failure(e: BuoyError) -> Response {
    error!("Store query failed: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// =======================
/// HANDLERS
/// =======================

async fn list_stations(State(state): State<AppState>, Query(query): Query<StationsQuery>) -> Response {
    let stations = if query.all {
        state.store.stations()
    } else {
        state.store.ingested_stations()
    };

    match stations {
        Ok(stations) => Json(stations).into_response(),
        Err(e) => store_failure(e),
    }
}

async fn station_timesteps(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    match state.store.station(&code) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return store_failure(e),
    }

    let steps = match state.store.time_steps_for(&code) {
        Ok(steps) => steps,
        Err(e) => return store_failure(e),
    };

    let out: Vec<TimeStepSummary> = steps
        .into_iter()
        .map(|s| {
            let sea = s.record.bulk.sea_state;
            TimeStepSummary {
                id: s.id,
                timestamp: s.record.timestamp,
                spectra_ingested: s.spectra_ingested,
                separation_frequency: s.record.separation_frequency,
                hm0: sea.map(|v| v.hm0),
                te: sea.map(|v| v.te),
                power: sea.map(|v| v.power),
            }
        })
        .collect();

    Json(out).into_response()
}

async fn time_step(State(state): State<AppState>, Path(id): Path<TimeStepId>) -> Response {
    match state.store.time_step(id) {
        Ok(Some(step)) => Json(step).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => store_failure(e),
    }
}

async fn time_step_spectrum(State(state): State<AppState>, Path(id): Path<TimeStepId>) -> Response {
    match state.store.frequency_parameters(id) {
        Ok(rows) if rows.is_empty() => StatusCode::NOT_FOUND.into_response(),
        Ok(rows) => Json(rows).into_response(),
        Err(e) => store_failure(e),
    }
}

async fn time_step_directional(
    State(state): State<AppState>,
    Path(id): Path<TimeStepId>,
    Query(query): Query<DirectionalQuery>,
) -> Response {
    debug!("directional slice: step={} f={}", id, query.frequency);

    let bin = match state.table.bin_for(query.frequency, FREQUENCY_LABEL_TOLERANCE) {
        Some(bin) => bin,
        None => return StatusCode::BAD_REQUEST.into_response(),
    };

    match state.store.directional_slice(id, bin) {
        Ok(rows) if rows.is_empty() => StatusCode::NOT_FOUND.into_response(),
        Ok(rows) => Json(rows).into_response(),
        Err(e) => store_failure(e),
    }
}

async fn status(State(state): State<AppState>) -> Response {
    let counts = match state.store.counts() {
        Ok(c) => c,
        Err(e) => return store_failure(e),
    };

    let mut stations: Vec<StationStatus> = state.status.read().await.values().cloned().collect();
    stations.sort_by(|a, b| a.station.cmp(&b.station));

    Json(StatusResponse { counts, stations }).into_response()
}

async fn trigger_ingest(State(state): State<AppState>) -> Response {
    match run_once(&state).await {
        Some(results) => Json(results).into_response(),
        None => StatusCode::CONFLICT.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::{Connection, ServiceConfig, SourceConfig, StationConfig};
    use crate::utils::conf_helper::open_store;
    use buoyspec::{DirectionGrid, FrequencyTable, Station};

    fn state() -> AppState {
        let config = ServiceConfig {
            name: "buoyspec".to_string(),
            version: "0.1.0".to_string(),
            description: String::new(),
            connection: Connection {
                ip: "127.0.0.1".to_string(),
                port: 0,
            },
            source: SourceConfig::Directory {
                path: String::new(),
            },
            frequency_table: String::new(),
            direction_step_deg: 5.0,
            stations: vec![StationConfig {
                code: "46026".to_string(),
                name: "San Francisco".to_string(),
                lat: 37.75,
                lon: -122.84,
                depth: None,
            }],
            snapshot_path: None,
            refresh_interval_secs: None,
        };
        let store = open_store(&config).unwrap();
        let table = FrequencyTable::from_pairs(&[(0.03, 0.01)]).unwrap();
        AppState::new(config, store, table, DirectionGrid::default())
    }

    async fn stations_in(response: Response) -> Vec<Station> {
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_stations_hide_unprocessed_unless_all() {
        let state = state();

        let listed = stations_in(
            list_stations(State(state.clone()), Query(StationsQuery::default())).await,
        )
        .await;
        assert!(listed.is_empty());

        let all = stations_in(
            list_stations(State(state.clone()), Query(StationsQuery { all: true })).await,
        )
        .await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].code, "46026");
    }

    #[tokio::test]
    async fn test_spectrum_of_largest_id_is_not_found() {
        let state = state();
        let response = time_step_spectrum(State(state.clone()), Path(TimeStepId::MAX)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(state.store.counts().is_ok());
    }
}
