//! Persistence boundary for stations, time steps and reconstructed spectra.
//!
//! Every insert is keyed by its uniqueness constraint and ignores conflicts,
//! so a retried write never duplicates rows. The `spectra_ingested` flag on a
//! time step is the ingestion ledger.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{BuoyError, Result};
use crate::core::format::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub stations: usize,
    pub time_steps: usize,
    pub processed: usize,
    pub frequency_rows: usize,
    pub directional_rows: usize,
}

pub trait SpectrumStore: Send + Sync {
    /// Insert a station; an existing code is left untouched. Returns whether
    /// a row was added.
    fn register_station(&self, station: Station) -> Result<bool>;

    fn station(&self, code: &str) -> Result<Option<Station>>;

    fn stations(&self) -> Result<Vec<Station>>;

    /// Stations with at least one time step whose spectrum is ingested.
    fn ingested_stations(&self) -> Result<Vec<Station>>;

    /// Insert a time step unique on (station, timestamp). On conflict the
    /// stored row wins and its id is returned with `false`.
    fn upsert_time_step(&self, record: TimeStepRecord) -> Result<(TimeStepId, bool)>;

    fn time_step(&self, id: TimeStepId) -> Result<Option<StoredTimeStep>>;

    /// Time steps of `station` whose directional spectrum is not yet ingested,
    /// oldest first.
    fn pending_time_steps(&self, station: &str) -> Result<Vec<(TimeStepId, DateTime<Utc>)>>;

    /// Insert-or-ignore on (time step, bin). Returns the number of new rows.
    fn insert_frequency_parameters(&self, rows: &[FrequencyParameters]) -> Result<usize>;

    /// Insert-or-ignore on (time step, bin, direction). Returns the number of
    /// new rows.
    fn insert_directional(&self, rows: &[DirectionalSpectrumEntry]) -> Result<usize>;

    /// Set the ledger flag. Returns `true` only on the first transition.
    fn mark_processed(&self, id: TimeStepId) -> Result<bool>;

    fn is_processed(&self, id: TimeStepId) -> Result<bool>;

    /// All time steps of a station, newest first.
    fn time_steps_for(&self, station: &str) -> Result<Vec<StoredTimeStep>>;

    fn frequency_parameters(&self, id: TimeStepId) -> Result<Vec<FrequencyParameters>>;

    /// Directional entries of one frequency bin, ordered by direction.
    fn directional_slice(&self, id: TimeStepId, bin: usize) -> Result<Vec<DirectionalSpectrumEntry>>;

    fn counts(&self) -> Result<StoreCounts>;
}

#[derive(Default)]
struct Tables {
    stations: BTreeMap<String, Station>,
    time_steps: BTreeMap<TimeStepId, StoredTimeStep>,
    step_index: HashMap<(String, DateTime<Utc>), TimeStepId>,
    next_id: TimeStepId,
    frequency: BTreeMap<(TimeStepId, usize), FrequencyParameters>,
    directional: BTreeMap<(TimeStepId, usize, usize), DirectionalSpectrumEntry>,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    stations: Vec<Station>,
    time_steps: Vec<StoredTimeStep>,
    frequency: Vec<FrequencyParameters>,
    directional: Vec<DirectionalSpectrumEntry>,
}

/// In-process store guarded by a single mutex; each call is one unit of work.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| BuoyError::Store("store lock poisoned".to_string()))
    }

    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let snapshot = {
            let t = self.lock()?;
            Snapshot {
                stations: t.stations.values().cloned().collect(),
                time_steps: t.time_steps.values().cloned().collect(),
                frequency: t.frequency.values().cloned().collect(),
                directional: t.directional.values().cloned().collect(),
            }
        };

        let json = serde_json::to_vec(&snapshot)?;
        std::fs::write(path.as_ref(), json)?;
        info!(
            "snapshot written to {} ({} time steps)",
            path.as_ref().display(),
            snapshot.time_steps.len()
        );
        Ok(())
    }

    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        let snapshot: Snapshot = serde_json::from_slice(&data)?;

        let mut t = Tables::default();
        for s in snapshot.stations {
            t.stations.insert(s.code.clone(), s);
        }
        for step in snapshot.time_steps {
            t.next_id = t.next_id.max(step.id + 1);
            t.step_index
                .insert((step.record.station.clone(), step.record.timestamp), step.id);
            t.time_steps.insert(step.id, step);
        }
        for row in snapshot.frequency {
            t.frequency.insert((row.time_step, row.bin), row);
        }
        for row in snapshot.directional {
            t.directional
                .insert((row.time_step, row.bin, row.direction_index), row);
        }

        info!(
            "snapshot loaded from {} ({} time steps)",
            path.as_ref().display(),
            t.time_steps.len()
        );
        Ok(Self {
            tables: Mutex::new(t),
        })
    }
}

impl SpectrumStore for MemoryStore {
    fn register_station(&self, station: Station) -> Result<bool> {
        let mut t = self.lock()?;
        if t.stations.contains_key(&station.code) {
            return Ok(false);
        }
        t.stations.insert(station.code.clone(), station);
        Ok(true)
    }

    fn station(&self, code: &str) -> Result<Option<Station>> {
        Ok(self.lock()?.stations.get(code).cloned())
    }

    fn stations(&self) -> Result<Vec<Station>> {
        Ok(self.lock()?.stations.values().cloned().collect())
    }

    fn ingested_stations(&self) -> Result<Vec<Station>> {
        let t = self.lock()?;
        let codes: BTreeSet<&str> = t
            .time_steps
            .values()
            .filter(|s| s.spectra_ingested)
            .map(|s| s.record.station.as_str())
            .collect();
        Ok(codes
            .into_iter()
            .filter_map(|code| t.stations.get(code).cloned())
            .collect())
    }

    fn upsert_time_step(&self, record: TimeStepRecord) -> Result<(TimeStepId, bool)> {
        let mut t = self.lock()?;
        if !t.stations.contains_key(&record.station) {
            return Err(BuoyError::StationNotFound(record.station));
        }

        let key = (record.station.clone(), record.timestamp);
        if let Some(&id) = t.step_index.get(&key) {
            return Ok((id, false));
        }

        let id = t.next_id;
        t.next_id += 1;
        t.step_index.insert(key, id);
        t.time_steps.insert(
            id,
            StoredTimeStep {
                id,
                record,
                spectra_ingested: false,
            },
        );
        Ok((id, true))
    }

    fn time_step(&self, id: TimeStepId) -> Result<Option<StoredTimeStep>> {
        Ok(self.lock()?.time_steps.get(&id).cloned())
    }

    fn pending_time_steps(&self, station: &str) -> Result<Vec<(TimeStepId, DateTime<Utc>)>> {
        let t = self.lock()?;
        let mut pending: Vec<_> = t
            .time_steps
            .values()
            .filter(|s| s.record.station == station && !s.spectra_ingested)
            .map(|s| (s.id, s.record.timestamp))
            .collect();
        pending.sort_by_key(|(_, ts)| *ts);
        Ok(pending)
    }

    fn insert_frequency_parameters(&self, rows: &[FrequencyParameters]) -> Result<usize> {
        let mut t = self.lock()?;
        let mut inserted = 0;
        for row in rows {
            if !t.time_steps.contains_key(&row.time_step) {
                return Err(BuoyError::TimeStepNotFound(row.time_step));
            }
            let key = (row.time_step, row.bin);
            if !t.frequency.contains_key(&key) {
                t.frequency.insert(key, row.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn insert_directional(&self, rows: &[DirectionalSpectrumEntry]) -> Result<usize> {
        let mut t = self.lock()?;
        let mut inserted = 0;
        for row in rows {
            if !t.time_steps.contains_key(&row.time_step) {
                return Err(BuoyError::TimeStepNotFound(row.time_step));
            }
            let key = (row.time_step, row.bin, row.direction_index);
            if !t.directional.contains_key(&key) {
                t.directional.insert(key, row.clone());
                inserted += 1;
            }
        }
        if inserted < rows.len() {
            debug!("ignored {} duplicate directional rows", rows.len() - inserted);
        }
        Ok(inserted)
    }

    fn mark_processed(&self, id: TimeStepId) -> Result<bool> {
        let mut t = self.lock()?;
        let step = t
            .time_steps
            .get_mut(&id)
            .ok_or(BuoyError::TimeStepNotFound(id))?;
        let first = !step.spectra_ingested;
        step.spectra_ingested = true;
        Ok(first)
    }

    fn is_processed(&self, id: TimeStepId) -> Result<bool> {
        self.lock()?
            .time_steps
            .get(&id)
            .map(|s| s.spectra_ingested)
            .ok_or(BuoyError::TimeStepNotFound(id))
    }

    fn time_steps_for(&self, station: &str) -> Result<Vec<StoredTimeStep>> {
        let t = self.lock()?;
        let mut steps: Vec<_> = t
            .time_steps
            .values()
            .filter(|s| s.record.station == station)
            .cloned()
            .collect();
        steps.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));
        Ok(steps)
    }

    fn frequency_parameters(&self, id: TimeStepId) -> Result<Vec<FrequencyParameters>> {
        let t = self.lock()?;
        Ok(t.frequency
            .range((id, 0)..=(id, usize::MAX))
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn directional_slice(&self, id: TimeStepId, bin: usize) -> Result<Vec<DirectionalSpectrumEntry>> {
        let t = self.lock()?;
        Ok(t.directional
            .range((id, bin, 0)..=(id, bin, usize::MAX))
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn counts(&self) -> Result<StoreCounts> {
        let t = self.lock()?;
        Ok(StoreCounts {
            stations: t.stations.len(),
            time_steps: t.time_steps.len(),
            processed: t.time_steps.values().filter(|s| s.spectra_ingested).count(),
            frequency_rows: t.frequency.len(),
            directional_rows: t.directional.len(),
        })
    }
}
