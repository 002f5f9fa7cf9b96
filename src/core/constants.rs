// Constants for NDBC realtime sources and spectral derivations

use serde::{Deserialize, Serialize};
use std::fmt;

// Missing-value sentinels used by NDBC realtime files
pub const MISSING_SENTINELS: [&str; 2] = ["MM", "999.0"];

// Numeric sentinel, however it is written (999, 999.00, ...)
pub const MISSING_NUMERIC: f64 = 999.0;

// Sea water density (kg/m^3) and gravity (m/s^2) for the wave power estimate
pub const SEA_WATER_DENSITY: f64 = 1025.0;
pub const GRAVITY: f64 = 9.81;

// Default direction grid: 0..355 degrees in 5 degree steps (72 points)
pub const DEFAULT_DIRECTION_STEP_DEG: f64 = 5.0;

// Labels are printed with three decimals, e.g. (0.033) for the 0.0325 Hz bin
pub const FREQUENCY_LABEL_TOLERANCE: f64 = 1e-3;

// gzip magic bytes
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// The six per-station sources that make up one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Meteorological,
    EnergyDensity,
    Alpha1,
    Alpha2,
    R1,
    R2,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Meteorological,
        SourceKind::EnergyDensity,
        SourceKind::Alpha1,
        SourceKind::Alpha2,
        SourceKind::R1,
        SourceKind::R2,
    ];

    /// File suffix used by the NDBC realtime2 directory.
    pub fn suffix(&self) -> &'static str {
        match self {
            SourceKind::Meteorological => "txt",
            SourceKind::EnergyDensity => "data_spec",
            SourceKind::Alpha1 => "swdir",
            SourceKind::Alpha2 => "swdir2",
            SourceKind::R1 => "swr1",
            SourceKind::R2 => "swr2",
        }
    }

    /// Spectral rows of this kind carry a leading separation frequency column.
    pub fn has_separation_frequency(&self) -> bool {
        matches!(self, SourceKind::EnergyDensity)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}
