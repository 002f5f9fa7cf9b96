// Parsers for NDBC realtime station files

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::debug;

use crate::core::constants::{SourceKind, MISSING_NUMERIC, MISSING_SENTINELS};
use crate::core::error::{BuoyError, Result};
use crate::core::format::*;

const TIME_COLUMNS: usize = 5;

/// Parse one numeric field, mapping the reserved sentinels to `None`.
pub fn parse_value(token: &str) -> Option<std::result::Result<f64, std::num::ParseFloatError>> {
    if MISSING_SENTINELS.contains(&token) {
        return None;
    }
    match token.parse::<f64>() {
        Ok(v) if v == MISSING_NUMERIC => None,
        parsed => Some(parsed),
    }
}

fn value_at(kind: SourceKind, line: usize, token: &str) -> Result<Option<f64>> {
    match parse_value(token) {
        None => Ok(None),
        Some(Ok(v)) => Ok(Some(v)),
        Some(Err(e)) => Err(BuoyError::ParseError {
            kind,
            line,
            message: format!("invalid number {:?}: {}", token, e),
        }),
    }
}

fn parse_timestamp(kind: SourceKind, line: usize, tokens: &[&str]) -> Result<DateTime<Utc>> {
    let err = |message: String| BuoyError::ParseError {
        kind,
        line,
        message,
    };

    if tokens.len() < TIME_COLUMNS {
        return Err(err(format!("expected {} time columns", TIME_COLUMNS)));
    }

    let mut parts = [0u32; TIME_COLUMNS];
    for (slot, token) in parts.iter_mut().zip(tokens) {
        *slot = token
            .parse::<u32>()
            .map_err(|e| err(format!("invalid time field {:?}: {}", token, e)))?;
    }

    let year = match parts[0] {
        y if y < 50 => 2000 + y,
        y if y < 100 => 1900 + y,
        y => y,
    };

    let naive = NaiveDate::from_ymd_opt(year as i32, parts[1], parts[2])
        .and_then(|d| d.and_hms_opt(parts[3], parts[4], 0))
        .ok_or_else(|| err(format!("invalid date {:?}", &tokens[..TIME_COLUMNS])))?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// Data rows with their 1-based line numbers; `#` lines are headers or units.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
}

/// Parse the primary meteorological series (`<station>.txt`).
///
/// Columns are located by the names in the first `#` header line, so extra or
/// reordered columns are tolerated.
pub fn parse_meteorological(station: &str, text: &str) -> Result<Vec<MetRecord>> {
    let kind = SourceKind::Meteorological;

    let header: Vec<String> = text
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with('#'))
        .map(|l| {
            l.trim_start_matches('#')
                .split_whitespace()
                .map(|s| s.to_ascii_uppercase())
                .collect()
        })
        .ok_or_else(|| BuoyError::ParseError {
            kind,
            line: 1,
            message: "missing column header".to_string(),
        })?;

    let column = |name: &str| header.iter().position(|h| h == name);
    let wdir = column("WDIR");
    let wspd = column("WSPD");
    let gst = column("GST");
    let wvht = column("WVHT");
    let dpd = column("DPD");
    let apd = column("APD");
    let mwd = column("MWD");
    let pres = column("PRES");
    let atmp = column("ATMP");
    let wtmp = column("WTMP");
    let dewp = column("DEWP");
    let vis = column("VIS");
    let ptdy = column("PTDY");
    let tide = column("TIDE");

    let mut records = Vec::new();

    for (line, row) in data_lines(text) {
        let tokens: Vec<&str> = row.split_whitespace().collect();
        let timestamp = parse_timestamp(kind, line, &tokens)?;

        let field = |idx: Option<usize>| -> Result<Option<f64>> {
            match idx.and_then(|i| tokens.get(i)) {
                Some(token) => value_at(kind, line, token),
                None => Ok(None),
            }
        };

        let observation = MetObservation {
            wind_dir: field(wdir)?,
            wind_speed: field(wspd)?,
            gust: field(gst)?,
            wave_height: field(wvht)?,
            dominant_period: field(dpd)?,
            average_period: field(apd)?,
            mean_wave_dir: field(mwd)?,
            pressure: field(pres)?,
            air_temp: field(atmp)?,
            water_temp: field(wtmp)?,
            dewpoint: field(dewp)?,
            visibility: field(vis)?,
            pressure_tendency: field(ptdy)?,
            tide: field(tide)?,
        };

        records.push(MetRecord {
            station: station.to_string(),
            timestamp,
            observation,
        });
    }

    debug!("parsed {} {} rows for {}", records.len(), kind, station);
    Ok(records)
}

/// Parse a per-frequency series (`.data_spec`, `.swdir`, `.swdir2`, `.swr1`,
/// `.swr2`). Each value may be followed by its frequency label in parentheses.
pub fn parse_spectral(station: &str, kind: SourceKind, text: &str) -> Result<Vec<SpectralSeriesRow>> {
    let mut rows = Vec::new();

    for (line, row) in data_lines(text) {
        let tokens: Vec<&str> = row.split_whitespace().collect();
        let timestamp = parse_timestamp(kind, line, &tokens)?;

        let mut rest = tokens[TIME_COLUMNS..].iter();

        let separation_frequency = if kind.has_separation_frequency() {
            match rest.next() {
                Some(token) => value_at(kind, line, token)?,
                None => None,
            }
        } else {
            None
        };

        let mut values = Vec::new();
        let mut labels: Vec<Option<f64>> = Vec::new();

        for token in rest {
            if let Some(inner) = token.strip_prefix('(') {
                let inner = inner.trim_end_matches(')');
                let label = labels.last_mut().ok_or_else(|| BuoyError::ParseError {
                    kind,
                    line,
                    message: format!("frequency label {} without a value", token),
                })?;
                *label = value_at(kind, line, inner)?;
            } else {
                values.push(value_at(kind, line, token)?);
                labels.push(None);
            }
        }

        rows.push(SpectralSeriesRow {
            station: station.to_string(),
            timestamp,
            separation_frequency,
            values,
            labels,
        });
    }

    debug!("parsed {} {} rows for {}", rows.len(), kind, station);
    Ok(rows)
}
