//! Output tables consumed by the aggregation tooling.
//!
//! Column headers and file names are fixed: `time(ps)` with
//! `viscosity(Pa.s)` for the two running-viscosity tables, and `time(ps)`
//! with `ACF` for the normalized average autocorrelation.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ingest::IngestReport;
use crate::prelude::{RunParameters, ViscosityError, ViscosityResult};
use crate::records::{AcfSeries, ViscosityTimeSeries};
use crate::telemetry::log::LogManager;

pub const EINSTEIN_TABLE: &str = "viscosity_Einstein.csv";
pub const GREEN_KUBO_TABLE: &str = "viscosity_GK.csv";
pub const ACF_TABLE: &str = "avg_acf.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// `<stem>_data`, placed under `base` or the current directory.
pub fn output_dir_for(datafile: &Path, base: Option<&Path>) -> PathBuf {
    let stem = datafile
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stress".to_string());
    let name = format!("{}_data", stem);
    match base {
        Some(base) => base.join(name),
        None => PathBuf::from(name),
    }
}

/// Machine-readable record of one run, written next to the tables.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub datafile: String,
    pub parameters: RunParameters,
    pub ingest: IngestReport,
    pub simulated_time_ps: f64,
    /// Last running value of each estimator in Pa·s, at full resolution.
    pub einstein_final: Option<f64>,
    pub green_kubo_final: Option<f64>,
}

/// Full-resolution results of one run, ready to be written.
pub struct RunTables<'a> {
    pub einstein: &'a ViscosityTimeSeries,
    pub green_kubo: &'a ViscosityTimeSeries,
    pub acf: &'a AcfSeries,
    pub summary: &'a RunSummary,
}

/// Writes the three tables and the summary into `dir`, down-sampling both
/// viscosity series by `each`. Returns the written paths.
///
/// On failure every file touched by this call is removed again, together
/// with `dir` when this call created it.
pub fn write_run(
    dir: &Path,
    tables: &RunTables<'_>,
    each: usize,
) -> ViscosityResult<Vec<PathBuf>> {
    let logger = LogManager::new("output");
    let created_dir = !dir.exists();
    fs::create_dir_all(dir).map_err(|source| ViscosityError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut touched = Vec::with_capacity(4);
    match write_files(dir, tables, each, &mut touched) {
        Ok((einstein_len, green_kubo_len)) => {
            logger.record(&format!(
                "wrote {} Einstein and {} Green-Kubo points to {}",
                einstein_len,
                green_kubo_len,
                dir.display()
            ));
            Ok(touched)
        }
        Err(err) => {
            for path in &touched {
                let _ = fs::remove_file(path);
            }
            if created_dir {
                let _ = fs::remove_dir(dir);
            }
            logger.caution(&format!(
                "discarded partial output in {}: {}",
                dir.display(),
                err
            ));
            Err(err)
        }
    }
}

/// Pushes each path onto `touched` before writing it.
fn write_files(
    dir: &Path,
    tables: &RunTables<'_>,
    each: usize,
    touched: &mut Vec<PathBuf>,
) -> ViscosityResult<(usize, usize)> {
    let einstein = tables.einstein.downsample(each);
    let green_kubo = tables.green_kubo.downsample(each);

    let path = dir.join(EINSTEIN_TABLE);
    touched.push(path.clone());
    write_table(&path, einstein.points())?;

    let path = dir.join(ACF_TABLE);
    touched.push(path.clone());
    write_table(&path, tables.acf.points())?;

    let path = dir.join(GREEN_KUBO_TABLE);
    touched.push(path.clone());
    write_table(&path, green_kubo.points())?;

    let path = dir.join(SUMMARY_FILE);
    let file = File::create(&path).map_err(|source| ViscosityError::Io {
        path: path.clone(),
        source,
    })?;
    touched.push(path);
    serde_json::to_writer_pretty(file, tables.summary)?;

    Ok((einstein.len(), green_kubo.len()))
}

/// Serializes `rows` as a headed CSV table at `path`.
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> ViscosityResult<()> {
    let csv_err = |source| ViscosityError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ViscosityError::Io {
        path: path.to_path_buf(),
        source,
    })
}
