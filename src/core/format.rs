// Data structures for buoy observations and reconstructed spectra

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::bulk::BulkParameters;

pub type TimeStepId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub code: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub depth: Option<f64>,
}

impl Station {
    pub fn new(code: impl Into<String>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            lat,
            lon,
            depth: None,
        }
    }
}

/// Row identity shared by every source table.
pub trait Stamped {
    fn station(&self) -> &str;
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Scalar meteorological and wave fields from the primary series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetObservation {
    pub wind_dir: Option<f64>,
    pub wind_speed: Option<f64>,
    pub gust: Option<f64>,
    pub wave_height: Option<f64>,
    pub dominant_period: Option<f64>,
    pub average_period: Option<f64>,
    pub mean_wave_dir: Option<f64>,
    pub pressure: Option<f64>,
    pub air_temp: Option<f64>,
    pub water_temp: Option<f64>,
    pub dewpoint: Option<f64>,
    pub visibility: Option<f64>,
    pub pressure_tendency: Option<f64>,
    pub tide: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetRecord {
    pub station: String,
    pub timestamp: DateTime<Utc>,
    pub observation: MetObservation,
}

impl Stamped for MetRecord {
    fn station(&self) -> &str {
        &self.station
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// One row of a per-frequency series (energy density or a directional moment).
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralSeriesRow {
    pub station: String,
    pub timestamp: DateTime<Utc>,
    pub separation_frequency: Option<f64>,
    pub values: Vec<Option<f64>>,
    /// Frequency labels printed next to each value, when present.
    pub labels: Vec<Option<f64>>,
}

impl Stamped for SpectralSeriesRow {
    fn station(&self) -> &str {
        &self.station
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Everything fetched for one station before alignment.
#[derive(Debug, Clone, Default)]
pub struct RawStationData {
    pub station: String,
    pub meteorological: Vec<MetRecord>,
    pub energy_density: Vec<SpectralSeriesRow>,
    pub alpha1: Vec<SpectralSeriesRow>,
    pub alpha2: Vec<SpectralSeriesRow>,
    pub r1: Vec<SpectralSeriesRow>,
    pub r2: Vec<SpectralSeriesRow>,
}

/// Fourier directional moments for one frequency bin.
///
/// `alpha1` and `alpha2` are in mathematical radians once a moment leaves the
/// aligner; the raw sources carry meteorological degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionalMoment {
    pub alpha1: Option<f64>,
    pub alpha2: Option<f64>,
    pub r1: Option<f64>,
    pub r2: Option<f64>,
}

/// A time step present in all six sources, with typed per-bin columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedStep {
    pub timestamp: DateTime<Utc>,
    pub observation: MetObservation,
    pub separation_frequency: Option<f64>,
    pub energy_density: Vec<Option<f64>>,
    pub moments: Vec<DirectionalMoment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedStation {
    pub station: String,
    pub steps: Vec<AlignedStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStepRecord {
    pub station: String,
    pub timestamp: DateTime<Utc>,
    pub observation: MetObservation,
    /// Swell/wind-sea separation frequency from `.data_spec` (Hz)
    #[serde(default)]
    pub separation_frequency: Option<f64>,
    pub bulk: BulkParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTimeStep {
    pub id: TimeStepId,
    pub record: TimeStepRecord,
    pub spectra_ingested: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyParameters {
    pub time_step: TimeStepId,
    pub bin: usize,
    pub frequency: f64,
    pub bandwidth: f64,
    pub energy_density: Option<f64>,
    pub moment: DirectionalMoment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalSpectrumEntry {
    pub time_step: TimeStepId,
    pub bin: usize,
    pub frequency: f64,
    pub direction_index: usize,
    pub direction_deg: f64,
    pub spreading: f64,
    pub energy_density: Option<f64>,
}
