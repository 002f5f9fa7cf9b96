use chrono::Utc;
use tokio::task::JoinSet;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use buoyspec::{ingest_station, parse_station, IngestContext, IngestReport};

use crate::state::app_state::{AppState, StationStatus};

async fn ingest_one(state: &AppState, code: &str) -> anyhow::Result<IngestReport> {
    let texts = state.fetcher.fetch_texts(code).await?;

    let state = state.clone();
    let code = code.to_string();
    let report = tokio::task::spawn_blocking(move || {
        let raw = parse_station(&code, &texts)?;
        let ctx = IngestContext::new(state.store.as_ref(), &state.table, &state.grid);
        ingest_station(&ctx, &raw)
    })
    .await??;

    Ok(report)
}

/// Ingest every configured station once, each in its own task.
///
/// Returns `None` when another run is still in progress.
pub async fn run_once(state: &AppState) -> Option<Vec<StationStatus>> {
    let _guard = match state.run_lock.try_lock() {
        Ok(guard) => guard,
        Err(_) => {
            warn!("Ingestion run already in progress");
            return None;
        }
    };

    info!("Ingestion run started for {} stations", state.config.stations.len());

    let mut jobs = JoinSet::new();
    for station in &state.config.stations {
        let state = state.clone();
        let code = station.code.clone();

        jobs.spawn(async move {
            let outcome = ingest_one(&state, &code).await;
            if let Err(e) = &outcome {
                error!("Station {} failed: {:#}", code, e);
            }
            StationStatus {
                station: code,
                finished_at: Utc::now(),
                report: outcome.as_ref().ok().cloned(),
                error: outcome.err().map(|e| format!("{:#}", e)),
            }
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = jobs.join_next().await {
        match joined {
            Ok(status) => results.push(status),
            Err(e) => error!("Station job aborted: {}", e),
        }
    }
    results.sort_by(|a, b| a.station.cmp(&b.station));

    {
        let mut status = state.status.write().await;
        for s in &results {
            status.insert(s.station.clone(), s.clone());
        }
    }

    if let Some(path) = state.config.snapshot_path.clone() {
        let store = state.store.clone();
        match tokio::task::spawn_blocking(move || store.save_snapshot(&path)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Snapshot failed: {}", e),
            Err(e) => error!("Snapshot task aborted: {}", e),
        }
    }

    let failed = results.iter().filter(|s| s.error.is_some()).count();
    info!(
        "Ingestion run finished: {} ok, {} failed",
        results.len() - failed,
        failed
    );

    Some(results)
}

pub async fn start_refresh_loop(state: AppState, interval_secs: u64) {
    info!("Refresh worker started, every {}s", interval_secs);

    loop {
        sleep(Duration::from_secs(interval_secs)).await;
        run_once(&state).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::{Connection, ServiceConfig, SourceConfig, StationConfig};
    use buoyspec::{DirectionGrid, FrequencyTable, SpectrumStore};

    const MET: &str = "\
#YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE
#yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT   hPa  degC  degC  degC  nmi  hPa    ft
2024 01 15 12 40 250  7.0  9.0   1.5    10   6.3 270 1017.5  12.3  13.1   8.0   MM +0.3    MM
";

    fn spectral(header: &str, lead: &str, values: [&str; 2]) -> String {
        format!(
            "#YY  MM DD hh mm {header}\n2024 01 15 12 40 {lead}{} (0.030) {} (0.040)\n",
            values[0], values[1]
        )
    }

    fn write_station(dir: &std::path::Path, code: &str) {
        let files = [
            ("txt", MET.to_string()),
            ("data_spec", spectral("Sep_Freq", "0.200 ", ["1.0", "2.0"])),
            ("swdir", spectral("alpha1", "", ["250.0", "260.0"])),
            ("swdir2", spectral("alpha2", "", ["255.0", "999.0"])),
            ("swr1", spectral("r1", "", ["0.80", "0.70"])),
            ("swr2", spectral("r2", "", ["0.40", "MM"])),
        ];
        for (suffix, body) in files {
            std::fs::write(dir.join(format!("{code}.{suffix}")), body).unwrap();
        }
    }

    fn state_for(dir: &std::path::Path, stations: &[&str]) -> AppState {
        let config = ServiceConfig {
            name: "buoyspec".to_string(),
            version: "0.1.0".to_string(),
            description: String::new(),
            connection: Connection {
                ip: "127.0.0.1".to_string(),
                port: 0,
            },
            source: SourceConfig::Directory {
                path: dir.display().to_string(),
            },
            frequency_table: String::new(),
            direction_step_deg: 5.0,
            stations: stations
                .iter()
                .map(|code| StationConfig {
                    code: code.to_string(),
                    name: format!("Station {code}"),
                    lat: 0.0,
                    lon: 0.0,
                    depth: None,
                })
                .collect(),
            snapshot_path: None,
            refresh_interval_secs: None,
        };
        let store = crate::utils::conf_helper::open_store(&config).unwrap();
        let table = FrequencyTable::from_pairs(&[(0.03, 0.01), (0.04, 0.01)]).unwrap();
        AppState::new(config, store, table, DirectionGrid::default())
    }

    #[tokio::test]
    async fn test_run_isolates_failing_station() {
        let dir = std::env::temp_dir().join(format!("buoyspec-runner-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        write_station(&dir, "46026");

        // 41009 has no files at all
        let state = state_for(&dir, &["41009", "46026"]);
        let results = run_once(&state).await.unwrap();

        let again = run_once(&state).await.unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(results.len(), 2);
        assert!(results[0].error.is_some());
        let report = results[1].report.as_ref().unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.directional_rows, 2 * 72);

        let rerun = again[1].report.as_ref().unwrap();
        assert_eq!(rerun.processed, 0);
        assert_eq!(rerun.already_processed, 1);

        let counts = state.store.counts().unwrap();
        assert_eq!(counts.time_steps, 1);
        assert_eq!(counts.directional_rows, 2 * 72);
        assert_eq!(state.status.read().await.len(), 2);
    }
}
