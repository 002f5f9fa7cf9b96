// Reconstruct directional spectra for a station from local NDBC files

use buoyspec::core::compression::decode_text;
use buoyspec::{
    ingest_station, parse_station, DirectionGrid, FrequencyTable, IngestContext, MemoryStore,
    SourceKind, SpectrumStore, Station,
};
use tracing::{info, Level};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let station = std::env::args().nth(1).unwrap_or_else(|| "46026".to_string());
    let dir = std::path::Path::new("demos/data");

    let table = FrequencyTable::parse(&std::fs::read_to_string("data/frequency_bins.csv")?)?;
    let grid = DirectionGrid::default();

    let mut texts: [String; 6] = Default::default();
    for (slot, kind) in texts.iter_mut().zip(SourceKind::ALL) {
        let bytes = std::fs::read(dir.join(format!("{}.{}", station, kind.suffix())))?;
        *slot = decode_text(&bytes)?;
    }

    let raw = parse_station(&station, &texts)?;

    let store = MemoryStore::new();
    store.register_station(Station::new(station.as_str(), "Demo station", 0.0, 0.0))?;
    let ctx = IngestContext::new(&store, &table, &grid);

    let report = ingest_station(&ctx, &raw)?;
    info!("Report: {:?}", report);

    for step in store.time_steps_for(&station)? {
        info!("Time step {} at {}", step.id, step.record.timestamp);
        match step.record.bulk.sea_state {
            Some(sea) => info!(
                "  Hm0 = {:.2} m, Te = {:.2} s, P = {:.2} kW/m",
                sea.hm0, sea.te, sea.power
            ),
            None => info!("  bulk parameters undefined"),
        }

        // Peak direction at the most energetic frequency
        let params = store.frequency_parameters(step.id)?;
        let peak = params
            .iter()
            .filter_map(|p| p.energy_density.map(|e| (p.bin, p.frequency, e)))
            .max_by(|a, b| a.2.total_cmp(&b.2));

        if let Some((bin, frequency, energy)) = peak {
            let slice = store.directional_slice(step.id, bin)?;
            if let Some(best) = slice.iter().max_by(|a, b| a.spreading.total_cmp(&b.spreading)) {
                info!(
                    "  peak f = {:.4} Hz, E = {:.3} m²/Hz, D max at {}° (math)",
                    frequency, energy, best.direction_deg
                );
            }
        }
    }

    let counts = store.counts()?;
    info!(
        "Stored {} time steps, {} directional rows",
        counts.time_steps, counts.directional_rows
    );

    Ok(())
}
