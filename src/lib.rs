// Buoy directional wave spectrum reconstruction
// Main library entry point

pub mod core;

// Re-export main types
pub use crate::core::bins::{FrequencyBin, FrequencyTable};
pub use crate::core::bulk::{BulkParameters, SeaState};
pub use crate::core::constants::SourceKind;
pub use crate::core::directional::{DirectionGrid, Spreading};
pub use crate::core::error::{BuoyError, Result};
pub use crate::core::format::{RawStationData, Station, TimeStepId};
pub use crate::core::ingest::{ingest_all, ingest_station, IngestContext, IngestReport};
pub use crate::core::store::{MemoryStore, SpectrumStore, StoreCounts};

/// Parse the six NDBC realtime texts of one station into raw series.
///
/// `texts` is indexed in [`SourceKind::ALL`] order.
pub fn parse_station(station: &str, texts: &[String; 6]) -> Result<RawStationData> {
    use crate::core::parser::{parse_meteorological, parse_spectral};

    Ok(RawStationData {
        station: station.to_string(),
        meteorological: parse_meteorological(station, &texts[0])?,
        energy_density: parse_spectral(station, SourceKind::EnergyDensity, &texts[1])?,
        alpha1: parse_spectral(station, SourceKind::Alpha1, &texts[2])?,
        alpha2: parse_spectral(station, SourceKind::Alpha2, &texts[3])?,
        r1: parse_spectral(station, SourceKind::R1, &texts[4])?,
        r2: parse_spectral(station, SourceKind::R2, &texts[5])?,
    })
}
