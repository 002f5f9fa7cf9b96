//! Directional spreading from truncated Fourier moments (Longuet-Higgins).
//!
//! For each frequency bin:
//!
//! ```text
//! D_raw(θ)  = 1/(2π) · [1 + 2·r1·cos(θ − α1) + 2·r2·cos(2(θ − α2))]
//! D_norm(θ) = D_raw(θ) / (Σ D_raw · Δθ)
//! ```
//!
//! θ and α are mathematical-convention radians. A zero raw sum divides by 1.

use std::f64::consts::PI;

use serde::Serialize;

use crate::core::constants::DEFAULT_DIRECTION_STEP_DEG;
use crate::core::error::{BuoyError, Result};
use crate::core::format::DirectionalMoment;

/// Fixed set of directions `0, step, 2·step, .. < 360` degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionGrid {
    step_deg: f64,
    directions_deg: Vec<f64>,
}

impl DirectionGrid {
    /// The step must be positive and divide 360 evenly.
    pub fn new(step_deg: f64) -> Result<Self> {
        if !(step_deg.is_finite() && step_deg > 0.0 && step_deg <= 360.0) {
            return Err(BuoyError::InvalidDirectionStep(step_deg));
        }

        let count = 360.0 / step_deg;
        if (count - count.round()).abs() > 1e-9 {
            return Err(BuoyError::InvalidDirectionStep(step_deg));
        }

        let directions_deg = (0..count.round() as usize)
            .map(|i| i as f64 * step_deg)
            .collect();

        Ok(Self {
            step_deg,
            directions_deg,
        })
    }

    pub fn step_deg(&self) -> f64 {
        self.step_deg
    }

    pub fn step_rad(&self) -> f64 {
        self.step_deg.to_radians()
    }

    pub fn directions_deg(&self) -> &[f64] {
        &self.directions_deg
    }

    pub fn len(&self) -> usize {
        self.directions_deg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions_deg.is_empty()
    }
}

impl Default for DirectionGrid {
    fn default() -> Self {
        let step_deg = DEFAULT_DIRECTION_STEP_DEG;
        Self {
            step_deg,
            directions_deg: (0..72).map(|i| i as f64 * step_deg).collect(),
        }
    }
}

/// Normalized spreading values for one frequency, one per grid direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Spreading {
    pub values: Vec<f64>,
    /// Every coefficient was zero or absent; `values` is the uniform 1/(2π).
    pub degenerate: bool,
}

impl Spreading {
    /// Σ D(θ)·Δθ, which is 1 for a normalized distribution.
    pub fn integral(&self, grid: &DirectionGrid) -> f64 {
        self.values.iter().sum::<f64>() * grid.step_rad()
    }
}

fn harmonic(alpha: Option<f64>, r: Option<f64>) -> Option<(f64, f64)> {
    Some((alpha?, r?))
}

/// Reconstruct and normalize D(θ) for a single frequency bin.
///
/// A harmonic whose mean direction or spread is absent cannot be evaluated and
/// is left out of the series.
pub fn spreading(moment: &DirectionalMoment, grid: &DirectionGrid) -> Spreading {
    let first = harmonic(moment.alpha1, moment.r1);
    let second = harmonic(moment.alpha2, moment.r2);

    let degenerate = [moment.alpha1, moment.alpha2, moment.r1, moment.r2]
        .iter()
        .all(|c| c.map_or(true, |v| v == 0.0));

    let raw: Vec<f64> = grid
        .directions_deg()
        .iter()
        .map(|deg| {
            let theta = deg.to_radians();
            let mut series = 1.0;
            if let Some((a1, r1)) = first {
                series += 2.0 * r1 * (theta - a1).cos();
            }
            if let Some((a2, r2)) = second {
                series += 2.0 * r2 * (2.0 * (theta - a2)).cos();
            }
            series / (2.0 * PI)
        })
        .collect();

    let sum = raw.iter().sum::<f64>() * grid.step_rad();
    let divisor = if sum == 0.0 { 1.0 } else { sum };

    Spreading {
        values: raw.into_iter().map(|d| d / divisor).collect(),
        degenerate,
    }
}

/// Spreading for every frequency bin of one time step.
pub fn reconstruct(moments: &[DirectionalMoment], grid: &DirectionGrid) -> Vec<Spreading> {
    moments.iter().map(|m| spreading(m, grid)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::angle::met_to_math;

    fn moment(a1: f64, a2: f64, r1: f64, r2: f64) -> DirectionalMoment {
        DirectionalMoment {
            alpha1: Some(a1),
            alpha2: Some(a2),
            r1: Some(r1),
            r2: Some(r2),
        }
    }

    #[test]
    fn test_default_grid() {
        let grid = DirectionGrid::default();
        assert_eq!(grid.len(), 72);
        assert_eq!(grid.directions_deg()[71], 355.0);
        assert_eq!(grid, DirectionGrid::new(5.0).unwrap());
    }

    #[test]
    fn test_invalid_steps() {
        assert!(DirectionGrid::new(0.0).is_err());
        assert!(DirectionGrid::new(-5.0).is_err());
        assert!(DirectionGrid::new(7.0).is_err());
        assert!(DirectionGrid::new(f64::NAN).is_err());
        assert_eq!(DirectionGrid::new(2.5).unwrap().len(), 144);
    }

    #[test]
    fn test_normalized_integrates_to_one() {
        let grid = DirectionGrid::default();
        let cases = [
            moment(met_to_math(250.0), met_to_math(260.0), 0.8, 0.5),
            moment(0.3, 2.9, 0.2, 0.9),
            moment(met_to_math(10.0), met_to_math(350.0), 0.95, 0.95),
            DirectionalMoment {
                alpha1: Some(1.0),
                alpha2: None,
                r1: Some(0.6),
                r2: Some(0.4),
            },
        ];

        for m in cases {
            let d = spreading(&m, &grid);
            assert!(!d.degenerate);
            assert!(d.values.iter().all(|v| v.is_finite()));
            assert!((d.integral(&grid) - 1.0).abs() < 1e-6);
        }

        let fine = DirectionGrid::new(1.0).unwrap();
        let d = spreading(&moment(2.0, 2.0, 0.7, 0.3), &fine);
        assert!((d.integral(&fine) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_is_uniform() {
        let grid = DirectionGrid::default();
        let d = spreading(&moment(0.0, 0.0, 0.0, 0.0), &grid);
        assert!(d.degenerate);
        for v in &d.values {
            assert!((v - 1.0 / (2.0 * PI)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_all_absent_is_uniform() {
        let grid = DirectionGrid::default();
        let d = spreading(&DirectionalMoment::default(), &grid);
        assert!(d.degenerate);
        assert!(d.values.iter().all(|v| (v - 1.0 / (2.0 * PI)).abs() < 1e-12));
    }

    #[test]
    fn test_peak_follows_mean_direction() {
        let grid = DirectionGrid::default();
        // Waves from the west propagate towards math angle 0
        let a = met_to_math(270.0);
        let d = spreading(&moment(a, a, 0.9, 0.6), &grid);
        let peak = d
            .values
            .iter()
            .enumerate()
            .max_by(|x, y| x.1.partial_cmp(y.1).unwrap())
            .map(|(i, _)| grid.directions_deg()[i])
            .unwrap();
        assert_eq!(peak, 0.0);
    }

    #[test]
    fn test_reconstruct_per_bin() {
        let grid = DirectionGrid::default();
        let spreads = reconstruct(&[moment(0.0, 0.0, 0.5, 0.2), DirectionalMoment::default()], &grid);
        assert_eq!(spreads.len(), 2);
        assert!(!spreads[0].degenerate);
        assert!(spreads[1].degenerate);
        assert_eq!(spreads[0].values.len(), grid.len());
    }
}
