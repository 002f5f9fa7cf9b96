//! Series alignment across the six per-station sources.
//!
//! Only timestamps present in every source survive. Each source is restricted
//! to that common set in its original row order, and the rows at each position
//! must then agree on (station, timestamp) across all sources. Any
//! disagreement is an [`BuoyError::AlignmentFault`] for the whole station.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::core::angle::met_to_math_opt;
use crate::core::bins::FrequencyTable;
use crate::core::constants::{SourceKind, FREQUENCY_LABEL_TOLERANCE};
use crate::core::error::{BuoyError, Result};
use crate::core::format::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowKey {
    pub station: String,
    pub timestamp: DateTime<Utc>,
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.station, self.timestamp.format("%Y-%m-%d %H:%M"))
    }
}

pub fn timestamps<R: Stamped>(rows: &[R]) -> BTreeSet<DateTime<Utc>> {
    rows.iter().map(|r| r.timestamp()).collect()
}

/// Intersection of all timestamp sets; empty when there are no sets.
pub fn common_timestamps<I>(sets: I) -> BTreeSet<DateTime<Utc>>
where
    I: IntoIterator<Item = BTreeSet<DateTime<Utc>>>,
{
    let mut sets = sets.into_iter();
    let first = match sets.next() {
        Some(s) => s,
        None => return BTreeSet::new(),
    };
    sets.fold(first, |acc, s| acc.intersection(&s).copied().collect())
}

/// Rows whose timestamp is in `common`, in their original order.
pub fn restrict<R: Stamped + Clone>(rows: &[R], common: &BTreeSet<DateTime<Utc>>) -> Vec<R> {
    rows.iter()
        .filter(|r| common.contains(&r.timestamp()))
        .cloned()
        .collect()
}

pub fn row_keys<R: Stamped>(rows: &[R]) -> Vec<RowKey> {
    rows.iter()
        .map(|r| RowKey {
            station: r.station().to_string(),
            timestamp: r.timestamp(),
        })
        .collect()
}

/// Check that every column agrees position by position with the first one,
/// and that the first one belongs to `station`.
pub fn verify_positions(station: &str, columns: &[(SourceKind, Vec<RowKey>)]) -> Result<()> {
    let (ref_kind, reference) = match columns.first() {
        Some((kind, keys)) => (*kind, keys),
        None => return Ok(()),
    };

    let fault = |row: usize, kind: SourceKind, expected: String, found: String| {
        BuoyError::AlignmentFault {
            station: station.to_string(),
            row,
            kind,
            expected,
            found,
        }
    };

    for (row, key) in reference.iter().enumerate() {
        if key.station != station {
            return Err(fault(row, ref_kind, station.to_string(), key.to_string()));
        }
    }

    for (kind, keys) in &columns[1..] {
        let len = reference.len().max(keys.len());
        for row in 0..len {
            match (reference.get(row), keys.get(row)) {
                (Some(a), Some(b)) if a == b => {}
                (a, b) => {
                    let show = |k: Option<&RowKey>| {
                        k.map(|k| k.to_string()).unwrap_or_else(|| "<none>".to_string())
                    };
                    return Err(fault(row, *kind, show(a), show(b)));
                }
            }
        }
    }

    Ok(())
}

fn check_bins(kind: SourceKind, row: &SpectralSeriesRow, table: &FrequencyTable) -> Result<bool> {
    if row.values.len() != table.len() {
        return Err(BuoyError::BinCountMismatch {
            kind,
            timestamp: row.timestamp,
            expected: table.len(),
            found: row.values.len(),
        });
    }

    let labels_agree = row
        .labels
        .iter()
        .zip(table.bins())
        .all(|(label, bin)| match label {
            Some(f) => (f - bin.center).abs() <= FREQUENCY_LABEL_TOLERANCE,
            None => true,
        });

    Ok(labels_agree)
}

/// Align one station's raw sources into typed steps over `table`.
///
/// Directional means are converted to mathematical radians here, so nothing
/// downstream ever sees meteorological degrees.
pub fn align_station(raw: &RawStationData, table: &FrequencyTable) -> Result<AlignedStation> {
    let common = common_timestamps([
        timestamps(&raw.meteorological),
        timestamps(&raw.energy_density),
        timestamps(&raw.alpha1),
        timestamps(&raw.alpha2),
        timestamps(&raw.r1),
        timestamps(&raw.r2),
    ]);

    let met = restrict(&raw.meteorological, &common);
    let density = restrict(&raw.energy_density, &common);
    let alpha1 = restrict(&raw.alpha1, &common);
    let alpha2 = restrict(&raw.alpha2, &common);
    let r1 = restrict(&raw.r1, &common);
    let r2 = restrict(&raw.r2, &common);

    let columns = [
        (SourceKind::Meteorological, row_keys(&met)),
        (SourceKind::EnergyDensity, row_keys(&density)),
        (SourceKind::Alpha1, row_keys(&alpha1)),
        (SourceKind::Alpha2, row_keys(&alpha2)),
        (SourceKind::R1, row_keys(&r1)),
        (SourceKind::R2, row_keys(&r2)),
    ];
    verify_positions(&raw.station, &columns)?;

    let mut mislabeled = Vec::new();
    let mut steps = Vec::with_capacity(met.len());

    for (i, met_row) in met.into_iter().enumerate() {
        let rows = [
            (SourceKind::EnergyDensity, &density[i]),
            (SourceKind::Alpha1, &alpha1[i]),
            (SourceKind::Alpha2, &alpha2[i]),
            (SourceKind::R1, &r1[i]),
            (SourceKind::R2, &r2[i]),
        ];
        for (kind, row) in rows {
            if !check_bins(kind, row, table)? && !mislabeled.contains(&kind) {
                mislabeled.push(kind);
            }
        }

        let moments = (0..table.len())
            .map(|bin| DirectionalMoment {
                alpha1: met_to_math_opt(alpha1[i].values[bin]),
                alpha2: met_to_math_opt(alpha2[i].values[bin]),
                r1: r1[i].values[bin],
                r2: r2[i].values[bin],
            })
            .collect();

        steps.push(AlignedStep {
            timestamp: met_row.timestamp,
            observation: met_row.observation,
            separation_frequency: density[i].separation_frequency,
            energy_density: density[i].values.clone(),
            moments,
        });
    }

    for kind in mislabeled {
        warn!(
            "{}: {} frequency labels differ from the configured bin table",
            raw.station, kind
        );
    }

    debug!(
        "{}: source sizes met={} spec={} swdir={} swdir2={} swr1={} swr2={}",
        raw.station,
        raw.meteorological.len(),
        raw.energy_density.len(),
        raw.alpha1.len(),
        raw.alpha2.len(),
        raw.r1.len(),
        raw.r2.len()
    );
    info!("{}: aligned {} common time steps", raw.station, steps.len());

    Ok(AlignedStation {
        station: raw.station.clone(),
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap()
    }

    fn met(station: &str, hour: u32) -> MetRecord {
        MetRecord {
            station: station.to_string(),
            timestamp: t(hour),
            observation: MetObservation::default(),
        }
    }

    fn series(station: &str, hour: u32, values: &[Option<f64>]) -> SpectralSeriesRow {
        SpectralSeriesRow {
            station: station.to_string(),
            timestamp: t(hour),
            separation_frequency: None,
            values: values.to_vec(),
            labels: vec![None; values.len()],
        }
    }

    fn table() -> FrequencyTable {
        FrequencyTable::from_pairs(&[(0.03, 0.01), (0.04, 0.01)]).unwrap()
    }

    fn raw_with_hours(hours: &[u32]) -> RawStationData {
        let row = |h| series("46026", h, &[Some(1.0), Some(2.0)]);
        RawStationData {
            station: "46026".to_string(),
            meteorological: hours.iter().map(|&h| met("46026", h)).collect(),
            energy_density: hours.iter().map(|&h| row(h)).collect(),
            alpha1: hours.iter().map(|&h| row(h)).collect(),
            alpha2: hours.iter().map(|&h| row(h)).collect(),
            r1: hours.iter().map(|&h| row(h)).collect(),
            r2: hours.iter().map(|&h| row(h)).collect(),
        }
    }

    #[test]
    fn test_common_timestamps_intersection() {
        let a: BTreeSet<_> = [t(1), t(2), t(3)].into_iter().collect();
        let b: BTreeSet<_> = [t(1), t(2)].into_iter().collect();
        let c: BTreeSet<_> = [t(1), t(3)].into_iter().collect();
        let common = common_timestamps(vec![a, b, c]);
        assert_eq!(common.into_iter().collect::<Vec<_>>(), vec![t(1)]);
    }

    #[test]
    fn test_common_timestamps_empty_input() {
        assert!(common_timestamps(Vec::<BTreeSet<DateTime<Utc>>>::new()).is_empty());
    }

    #[test]
    fn test_restrict_preserves_order() {
        let rows = vec![met("46026", 3), met("46026", 1), met("46026", 2)];
        let common: BTreeSet<_> = [t(1), t(3)].into_iter().collect();
        let kept = restrict(&rows, &common);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].timestamp, t(3));
        assert_eq!(kept[1].timestamp, t(1));
    }

    #[test]
    fn test_align_station_drops_partial_timestamps() {
        let mut raw = raw_with_hours(&[3, 2, 1]);
        raw.alpha2.retain(|r| r.timestamp != t(2));
        raw.r1.retain(|r| r.timestamp != t(3));

        let aligned = align_station(&raw, &table()).unwrap();
        assert_eq!(aligned.steps.len(), 1);
        assert_eq!(aligned.steps[0].timestamp, t(1));
        assert_eq!(aligned.steps[0].energy_density, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_align_converts_directions_to_math_radians() {
        let mut raw = raw_with_hours(&[1]);
        raw.alpha1[0].values = vec![Some(270.0), None];
        let aligned = align_station(&raw, &table()).unwrap();
        let moments = &aligned.steps[0].moments;
        assert!(moments[0].alpha1.unwrap().abs() < 1e-12);
        assert_eq!(moments[1].alpha1, None);
        assert_eq!(moments[0].r1, Some(1.0));
    }

    #[test]
    fn test_mismatched_identifier_is_fault() {
        let mut raw = raw_with_hours(&[1, 2]);
        raw.r2[1].station = "41009".to_string();
        let err = align_station(&raw, &table()).unwrap_err();
        assert!(err.is_alignment_fault());
        match err {
            BuoyError::AlignmentFault { kind, row, .. } => {
                assert_eq!(kind, SourceKind::R2);
                assert_eq!(row, 1);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_order_source_is_fault() {
        let mut raw = raw_with_hours(&[1, 2]);
        raw.alpha1.reverse();
        assert!(align_station(&raw, &table()).unwrap_err().is_alignment_fault());
    }

    #[test]
    fn test_duplicate_timestamp_is_fault() {
        let mut raw = raw_with_hours(&[1, 2]);
        let dup = raw.energy_density[0].clone();
        raw.energy_density.push(dup);
        assert!(align_station(&raw, &table()).unwrap_err().is_alignment_fault());
    }

    #[test]
    fn test_bin_count_mismatch() {
        let mut raw = raw_with_hours(&[1]);
        raw.energy_density[0].values.push(Some(3.0));
        assert!(matches!(
            align_station(&raw, &table()),
            Err(BuoyError::BinCountMismatch { found: 3, expected: 2, .. })
        ));
    }
}
