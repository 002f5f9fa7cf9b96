//! Ingestion driver: align → bulk parameters → reconstruct → compose →
//! persist → flag, for one station at a time.
//!
//! Time steps already flagged in the ledger are skipped before any
//! reconstruction. For the rest, the full directional set is written with
//! insert-or-ignore semantics and only then is the flag set, so a run that
//! failed halfway can simply be repeated.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::core::align::align_station;
use crate::core::bins::FrequencyTable;
use crate::core::bulk;
use crate::core::directional::{reconstruct, DirectionGrid};
use crate::core::error::{BuoyError, Result};
use crate::core::format::*;
use crate::core::spectrum::compose;
use crate::core::store::SpectrumStore;

/// Handles a single ingestion run works against. Built per unit of work
/// rather than held globally.
#[derive(Clone, Copy)]
pub struct IngestContext<'a> {
    pub store: &'a dyn SpectrumStore,
    pub table: &'a FrequencyTable,
    pub grid: &'a DirectionGrid,
}

impl<'a> IngestContext<'a> {
    pub fn new(store: &'a dyn SpectrumStore, table: &'a FrequencyTable, grid: &'a DirectionGrid) -> Self {
        Self { store, table, grid }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub station: String,
    pub aligned: usize,
    pub new_time_steps: usize,
    pub undefined_bulk: usize,
    pub processed: usize,
    pub already_processed: usize,
    pub degenerate_bins: usize,
    pub directional_rows: usize,
}

/// Reconstructed output for one time step, ready to be written.
#[derive(Debug, Clone)]
pub struct StepSpectrum {
    pub time_step: TimeStepId,
    pub parameters: Vec<FrequencyParameters>,
    pub entries: Vec<DirectionalSpectrumEntry>,
    pub degenerate_bins: usize,
}

pub fn reconstruct_step(
    time_step: TimeStepId,
    step: &AlignedStep,
    table: &FrequencyTable,
    grid: &DirectionGrid,
) -> StepSpectrum {
    let spreading = reconstruct(&step.moments, grid);
    let entries = compose(time_step, table, grid, &spreading, &step.energy_density);

    let parameters = table
        .bins()
        .iter()
        .zip(&step.moments)
        .zip(&step.energy_density)
        .enumerate()
        .map(|(bin, ((freq_bin, moment), e))| FrequencyParameters {
            time_step,
            bin,
            frequency: freq_bin.center,
            bandwidth: freq_bin.bandwidth,
            energy_density: *e,
            moment: *moment,
        })
        .collect();

    StepSpectrum {
        time_step,
        parameters,
        entries,
        degenerate_bins: spreading.iter().filter(|d| d.degenerate).count(),
    }
}

/// Run the full pipeline for one station.
///
/// An alignment fault aborts before anything is written. A store failure
/// part-way leaves every step either flagged and complete, or unflagged and
/// safe to redo.
pub fn ingest_station(ctx: &IngestContext<'_>, raw: &RawStationData) -> Result<IngestReport> {
    let station = raw.station.as_str();

    if ctx.store.station(station)?.is_none() {
        return Err(BuoyError::StationNotFound(station.to_string()));
    }

    let aligned = match align_station(raw, ctx.table) {
        Ok(a) => a,
        Err(e) => {
            error!("{}: aborting ingestion: {}", station, e);
            return Err(e);
        }
    };

    let mut report = IngestReport {
        station: station.to_string(),
        aligned: aligned.steps.len(),
        ..Default::default()
    };

    let mut ids = Vec::with_capacity(aligned.steps.len());
    for step in &aligned.steps {
        let bulk = bulk::compute(ctx.table, &step.energy_density);
        if !bulk.is_defined() {
            report.undefined_bulk += 1;
        }

        let (id, inserted) = ctx.store.upsert_time_step(TimeStepRecord {
            station: station.to_string(),
            timestamp: step.timestamp,
            observation: step.observation.clone(),
            separation_frequency: step.separation_frequency,
            bulk,
        })?;
        if inserted {
            report.new_time_steps += 1;
        }
        ids.push(id);
    }

    let pending: HashSet<TimeStepId> = ctx
        .store
        .pending_time_steps(station)?
        .into_iter()
        .map(|(id, _)| id)
        .collect();

    let work: Vec<(TimeStepId, &AlignedStep)> = ids
        .iter()
        .copied()
        .zip(&aligned.steps)
        .filter(|(id, _)| pending.contains(id))
        .collect();
    report.already_processed = aligned.steps.len() - work.len();

    debug!(
        "{}: {} pending, {} already processed",
        station,
        work.len(),
        report.already_processed
    );

    let table = ctx.table;
    let grid = ctx.grid;
    let spectra: Vec<StepSpectrum> = work
        .par_iter()
        .map(|&(id, step)| reconstruct_step(id, step, table, grid))
        .collect();

    for spectrum in spectra {
        ctx.store.insert_frequency_parameters(&spectrum.parameters)?;
        let written = ctx.store.insert_directional(&spectrum.entries)?;
        if written < spectrum.entries.len() {
            warn!(
                "{}: time step {} was partially written before, {} rows already present",
                station,
                spectrum.time_step,
                spectrum.entries.len() - written
            );
        }
        ctx.store.mark_processed(spectrum.time_step)?;

        report.processed += 1;
        report.degenerate_bins += spectrum.degenerate_bins;
        report.directional_rows += written;
    }

    info!(
        "{}: {} aligned, {} new, {} reconstructed, {} skipped, {} directional rows",
        station,
        report.aligned,
        report.new_time_steps,
        report.processed,
        report.already_processed,
        report.directional_rows
    );

    Ok(report)
}

/// Ingest several stations in parallel. Each result stands alone; one
/// station's failure does not affect the others.
pub fn ingest_all(ctx: &IngestContext<'_>, feeds: &[RawStationData]) -> Vec<(String, Result<IngestReport>)> {
    feeds
        .par_iter()
        .map(|raw| (raw.station.clone(), ingest_station(ctx, raw)))
        .collect()
}
