//! Loading and validation of stress-tensor tables.
//!
//! Two tiers of strictness apply. Rows that are malformed at the table level
//! (undecodable, or carrying more fields than the header) are skipped and
//! counted. Rows that parse but hold an empty or non-numeric value in one of
//! the six stress columns abort the load with [`ViscosityError::Data`].

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::Serialize;

use crate::prelude::{RunParameters, ViscosityError, ViscosityResult};
use crate::telemetry::log::LogManager;
use crate::trajectory::{StressComponent, Trajectory};

/// Header of the optional leading frame-index column.
pub const FRAME_COLUMN: &str = "Frame";

/// Bookkeeping from one table load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub had_frame_column: bool,
}

/// Reads `path` into a trajectory converted to pascals.
///
/// The file is opened before the parameters are checked so an unreadable
/// input is always reported first.
pub fn load_trajectory<P: AsRef<Path>>(
    path: P,
    params: &RunParameters,
) -> ViscosityResult<(Trajectory, IngestReport)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ViscosityError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_trajectory(file, &path.display().to_string(), params)
}

/// Same as [`load_trajectory`] over any reader; `origin` names it in errors.
pub fn read_trajectory<R: Read>(
    reader: R,
    origin: &str,
    params: &RunParameters,
) -> ViscosityResult<(Trajectory, IngestReport)> {
    params.validate()?;
    let logger = LogManager::new("ingest");

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| ViscosityError::Csv {
            path: PathBuf::from(origin),
            source,
        })?
        .clone();
    if headers.is_empty() {
        return Err(ViscosityError::EmptyData {
            origin: origin.to_string(),
        });
    }

    let columns = locate_columns(&headers)?;
    let named_frame = headers.iter().any(|h| h == FRAME_COLUMN);
    let mut report = IngestReport {
        had_frame_column: named_frame,
        ..Default::default()
    };
    if named_frame {
        logger.detail("dropping frame-index column");
    }

    let factor = params.unit.to_pascal();
    let mut values = Vec::with_capacity(params.steps.min(1 << 20) * columns.len());

    for result in csv_reader.records() {
        if report.rows_read >= params.steps {
            break;
        }
        // A header one field short of the row means an unnamed leading index.
        let (record, offset) = match result {
            Ok(record) if record.len() <= headers.len() => (record, 0),
            Ok(record) if !named_frame && record.len() == headers.len() + 1 => {
                if !report.had_frame_column {
                    report.had_frame_column = true;
                    logger.detail("dropping unnamed leading index column");
                }
                (record, 1)
            }
            Ok(record) => {
                report.rows_skipped += 1;
                logger.detail(&format!(
                    "skipping line {}: {} fields, expected {}",
                    line_of(&record),
                    record.len(),
                    headers.len()
                ));
                continue;
            }
            Err(err) => {
                report.rows_skipped += 1;
                logger.detail(&format!("skipping malformed row: {}", err));
                continue;
            }
        };

        for (component, &index) in StressComponent::ALL.iter().zip(columns.iter()) {
            let raw = record.get(index + offset).unwrap_or("");
            let value = parse_value(raw).ok_or_else(|| ViscosityError::Data {
                row: line_of(&record),
                column: component.column_name().to_string(),
                value: raw.to_string(),
            })?;
            values.push(value * factor);
        }
        report.rows_read += 1;
    }

    if report.rows_read == 0 {
        return Err(ViscosityError::EmptyData {
            origin: origin.to_string(),
        });
    }

    let samples = Array2::from_shape_vec((report.rows_read, columns.len()), values)
        .map_err(|e| ViscosityError::InvalidParameters(e.to_string()))?;
    let trajectory = Trajectory::from_samples(samples, params.timestep)?;

    logger.record(&format!(
        "read {} rows from {} ({} skipped, unit {})",
        report.rows_read, origin, report.rows_skipped, params.unit
    ));
    logger.record(&format!(
        "total simulation time {} ps",
        trajectory.duration_ps()
    ));

    Ok((trajectory, report))
}

/// Column index of each stress component, in [`StressComponent::ALL`] order.
fn locate_columns(headers: &csv::StringRecord) -> ViscosityResult<[usize; 6]> {
    let mut columns = [0usize; 6];
    let mut missing = Vec::new();
    for (slot, component) in columns.iter_mut().zip(StressComponent::ALL.iter()) {
        match headers.iter().position(|h| h == component.column_name()) {
            Some(index) => *slot = index,
            None => missing.push(component.column_name().to_string()),
        }
    }
    if missing.is_empty() {
        Ok(columns)
    } else {
        Err(ViscosityError::Schema { missing })
    }
}

/// Parses a finite number; empty fields, NaN and infinities count as missing.
fn parse_value(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}
