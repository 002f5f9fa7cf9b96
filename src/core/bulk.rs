//! Bulk sea-state parameters from the 1-D frequency spectrum.
//!
//! ```text
//! m0     = Σ E(f)·Δf
//! Hm0    = 4·√m0
//! m₋₁    = Σ E(f)·Δf / f
//! Te     = m₋₁ / m0
//! P      = ρ·g²·Hm0²·Te / (64π·1000)      [kW/m]
//! ```
//!
//! Absent bins are skipped. With no bins present the moments are absent, and
//! whenever m0 is not strictly positive the sea state is undefined.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::core::bins::FrequencyTable;
use crate::core::constants::{GRAVITY, SEA_WATER_DENSITY};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeaState {
    /// Significant wave height from the spectrum (m)
    pub hm0: f64,
    /// Energy period (s)
    pub te: f64,
    /// Wave power per unit crest length (kW/m)
    pub power: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkParameters {
    pub m0: Option<f64>,
    pub m_minus1: Option<f64>,
    /// `None` when m0 is absent or zero.
    pub sea_state: Option<SeaState>,
}

impl BulkParameters {
    pub fn is_defined(&self) -> bool {
        self.sea_state.is_some()
    }
}

pub fn wave_power(hm0: f64, te: f64) -> f64 {
    SEA_WATER_DENSITY * GRAVITY.powi(2) * hm0.powi(2) * te / (64.0 * PI * 1000.0)
}

pub fn compute(table: &FrequencyTable, energy_density: &[Option<f64>]) -> BulkParameters {
    let mut m0 = 0.0;
    let mut m_minus1 = 0.0;
    let mut present = 0usize;

    for (bin, e) in table.bins().iter().zip(energy_density) {
        if let Some(e) = e {
            let band_energy = e * bin.bandwidth;
            m0 += band_energy;
            m_minus1 += band_energy / bin.center;
            present += 1;
        }
    }

    if present == 0 {
        return BulkParameters::default();
    }

    let sea_state = if m0 > 0.0 {
        let hm0 = 4.0 * m0.sqrt();
        let te = m_minus1 / m0;
        Some(SeaState {
            hm0,
            te,
            power: wave_power(hm0, te),
        })
    } else {
        None
    };

    BulkParameters {
        m0: Some(m0),
        m_minus1: Some(m_minus1),
        sea_state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FrequencyTable {
        FrequencyTable::from_pairs(&[(0.03, 0.01), (0.04, 0.01), (0.05, 0.01)]).unwrap()
    }

    #[test]
    fn test_three_bin_scenario() {
        let bulk = compute(&table(), &[Some(1.0), Some(2.0), Some(1.0)]);

        let m0 = bulk.m0.unwrap();
        assert!((m0 - 0.04).abs() < 1e-12);

        let m_minus1 = 0.01 / 0.03 + 0.02 / 0.04 + 0.01 / 0.05;
        assert!((bulk.m_minus1.unwrap() - m_minus1).abs() < 1e-12);

        let sea = bulk.sea_state.unwrap();
        assert!((sea.hm0 - 0.8).abs() < 1e-12);

        let te = m_minus1 / 0.04;
        assert!((sea.te - te).abs() < 1e-9);
        assert!((te - 25.8333333333).abs() < 1e-6);

        let p = 1025.0 * 9.81 * 9.81 * 0.64 * te / (64.0 * PI * 1000.0);
        assert!((sea.power - p).abs() < 1e-12);
        assert!((sea.power - 8.111337).abs() < 1e-5);
    }

    #[test]
    fn test_unit_impulse() {
        let bins = [(0.03, 0.01), (0.04, 0.02), (0.05, 0.01)];
        let table = FrequencyTable::from_pairs(&bins).unwrap();
        for i in 0..3 {
            let mut e = vec![Some(0.0); 3];
            e[i] = Some(1.0);
            let bulk = compute(&table, &e);
            let expected = bins[i].1;
            assert!((bulk.m0.unwrap() - expected).abs() < 1e-12);
            let hm0 = bulk.sea_state.unwrap().hm0;
            assert!((hm0 - 4.0 * expected.sqrt()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_spectrum_is_undefined() {
        let bulk = compute(&table(), &[Some(0.0), Some(0.0), Some(0.0)]);
        assert_eq!(bulk.m0, Some(0.0));
        assert!(bulk.sea_state.is_none());
        assert!(!bulk.is_defined());
    }

    #[test]
    fn test_all_absent_is_undefined() {
        let bulk = compute(&table(), &[None, None, None]);
        assert_eq!(bulk, BulkParameters::default());
    }

    #[test]
    fn test_absent_bins_are_skipped() {
        let bulk = compute(&table(), &[Some(1.0), None, Some(1.0)]);
        assert!((bulk.m0.unwrap() - 0.02).abs() < 1e-12);
        assert!(bulk.is_defined());
    }
}
