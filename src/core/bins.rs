//! Fixed frequency-bin table (center frequency and bandwidth per bin).
//!
//! The table is configuration, loaded once. Text layout:
//!
//! ```text
//! index,center_hz,bandwidth_hz
//! 1,0.0325,0.005
//! 2,0.0375,0.005
//! ```
//!
//! Comma or whitespace separated; the first non-blank line is a header.

use serde::{Deserialize, Serialize};

use crate::core::error::{BuoyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBin {
    pub center: f64,
    pub bandwidth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    bins: Vec<FrequencyBin>,
}

impl FrequencyTable {
    /// Build a table, checking ascending centers and positive bandwidths.
    pub fn new(bins: Vec<FrequencyBin>) -> Result<Self> {
        if bins.is_empty() {
            return Err(BuoyError::InvalidBinTable("no bins".to_string()));
        }

        for (i, bin) in bins.iter().enumerate() {
            if !(bin.center.is_finite() && bin.center > 0.0) {
                return Err(BuoyError::InvalidBinTable(format!(
                    "bin {} has non-positive center frequency {}",
                    i, bin.center
                )));
            }
            if !(bin.bandwidth.is_finite() && bin.bandwidth > 0.0) {
                return Err(BuoyError::InvalidBinTable(format!(
                    "bin {} has non-positive bandwidth {}",
                    i, bin.bandwidth
                )));
            }
        }

        for (i, pair) in bins.windows(2).enumerate() {
            if pair[1].center <= pair[0].center {
                return Err(BuoyError::InvalidBinTable(format!(
                    "bins not ascending at {}: {} >= {}",
                    i + 1,
                    pair[0].center,
                    pair[1].center
                )));
            }
        }

        Ok(Self { bins })
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        Self::new(
            pairs
                .iter()
                .map(|&(center, bandwidth)| FrequencyBin { center, bandwidth })
                .collect(),
        )
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut bins = Vec::new();

        let rows = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .skip(1);

        for (idx, line) in rows {
            let fields: Vec<&str> = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .collect();

            if fields.len() < 3 {
                return Err(BuoyError::InvalidBinTable(format!(
                    "line {}: expected index, center, bandwidth",
                    idx + 1
                )));
            }

            let parse = |s: &str| {
                s.parse::<f64>().map_err(|e| {
                    BuoyError::InvalidBinTable(format!("line {}: {}: {}", idx + 1, s, e))
                })
            };

            bins.push(FrequencyBin {
                center: parse(fields[1])?,
                bandwidth: parse(fields[2])?,
            });
        }

        Self::new(bins)
    }

    pub fn bins(&self) -> &[FrequencyBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn center(&self, bin: usize) -> Option<f64> {
        self.bins.get(bin).map(|b| b.center)
    }

    /// Index of the bin whose center is within `tolerance` of `frequency`.
    pub fn bin_for(&self, frequency: f64, tolerance: f64) -> Option<usize> {
        self.bins
            .iter()
            .position(|b| (b.center - frequency).abs() <= tolerance)
    }
}
