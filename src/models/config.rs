use serde::{Deserialize, Serialize};

use buoyspec::core::constants::DEFAULT_DIRECTION_STEP_DEG;
use buoyspec::Station;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub connection: Connection,
    pub source: SourceConfig,
    /// Path to the frequency-bin table (index, center_hz, bandwidth_hz)
    pub frequency_table: String,
    #[serde(default = "default_direction_step")]
    pub direction_step_deg: f64,
    pub stations: Vec<StationConfig>,
    #[serde(default)]
    pub snapshot_path: Option<String>,
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
}

fn default_direction_step() -> f64 {
    DEFAULT_DIRECTION_STEP_DEG
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// NDBC realtime2 style directory served over HTTP
    Http { base_url: String },
    /// Local directory holding `<station>.<suffix>` files, optionally `.gz`
    Directory { path: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    pub code: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub depth: Option<f64>,
}

impl From<&StationConfig> for Station {
    fn from(s: &StationConfig) -> Self {
        Station {
            code: s.code.clone(),
            name: s.name.clone(),
            lat: s.lat,
            lon: s.lon,
            depth: s.depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_with_defaults() {
        let json = r#"{
            "name": "buoyspec",
            "version": "0.1.0",
            "connection": { "ip": "127.0.0.1", "port": 0 },
            "source": { "kind": "http", "base_url": "https://www.ndbc.noaa.gov/data/realtime2" },
            "frequency_table": "data/frequency_bins.csv",
            "stations": [
                { "code": "46026", "name": "San Francisco", "lat": 37.75, "lon": -122.84 }
            ]
        }"#;

        let config: ServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.direction_step_deg, 5.0);
        assert_eq!(config.snapshot_path, None);
        assert_eq!(
            config.source,
            SourceConfig::Http {
                base_url: "https://www.ndbc.noaa.gov/data/realtime2".to_string()
            }
        );

        let station = Station::from(&config.stations[0]);
        assert_eq!(station.code, "46026");
        assert_eq!(station.depth, None);
    }

    #[test]
    fn test_directory_source() {
        let source: SourceConfig =
            serde_json::from_str(r#"{ "kind": "directory", "path": "data/realtime" }"#).unwrap();
        assert_eq!(
            source,
            SourceConfig::Directory {
                path: "data/realtime".to_string()
            }
        );
    }
}
