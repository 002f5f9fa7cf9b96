// Composition of the 2-D spectrum S(f,θ) = D(f,θ)·E(f)

use crate::core::bins::FrequencyTable;
use crate::core::directional::{DirectionGrid, Spreading};
use crate::core::format::{DirectionalSpectrumEntry, TimeStepId};

/// One entry per (bin, direction). Absent E(f) leaves S(f,θ) absent while the
/// spreading value is still recorded.
pub fn compose(
    time_step: TimeStepId,
    table: &FrequencyTable,
    grid: &DirectionGrid,
    spreading: &[Spreading],
    energy_density: &[Option<f64>],
) -> Vec<DirectionalSpectrumEntry> {
    let mut entries = Vec::with_capacity(table.len() * grid.len());

    for (bin, ((freq_bin, d), e)) in table
        .bins()
        .iter()
        .zip(spreading)
        .zip(energy_density)
        .enumerate()
    {
        for (direction_index, (&direction_deg, &value)) in
            grid.directions_deg().iter().zip(&d.values).enumerate()
        {
            entries.push(DirectionalSpectrumEntry {
                time_step,
                bin,
                frequency: freq_bin.center,
                direction_index,
                direction_deg,
                spreading: value,
                energy_density: e.map(|e| value * e),
            });
        }
    }

    entries
}
