//! Row-wise statistics across repeated runs.
//!
//! Each run contributes one running-viscosity table. Tables are aligned row by
//! row over their common prefix, which requires the runs to share a time axis.

use std::path::Path;

use serde::Serialize;

use crate::math::stats::StatsHelper;
use crate::prelude::{ViscosityError, ViscosityResult};
use crate::records::{ViscosityPoint, ViscosityTimeSeries};
use crate::telemetry::log::LogManager;

const TIME_COLUMN: &str = "time(ps)";
const VISCOSITY_COLUMN: &str = "viscosity(Pa.s)";

/// Relative tolerance when checking that runs share a time axis.
const TIME_TOLERANCE: f64 = 1e-9;

/// Running viscosity of one run, labelled for the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSeries {
    pub label: String,
    pub series: ViscosityTimeSeries,
}

impl RunSeries {
    /// Reads a `time(ps),viscosity(Pa.s)` table. The run is labelled with the
    /// name of its parent directory, or the file stem for bare files.
    pub fn load<P: AsRef<Path>>(path: P) -> ViscosityResult<Self> {
        let path = path.as_ref();
        let csv_err = |source| ViscosityError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = reader.headers().map_err(csv_err)?.clone();
        let missing: Vec<String> = [TIME_COLUMN, VISCOSITY_COLUMN]
            .iter()
            .filter(|name| !headers.iter().any(|h| h == **name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ViscosityError::Schema { missing });
        }

        let mut points = Vec::new();
        for record in reader.deserialize::<ViscosityPoint>() {
            points.push(record.map_err(csv_err)?);
        }

        Ok(Self {
            label: label_for(path),
            series: ViscosityTimeSeries::new(points),
        })
    }
}

fn label_for(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .or_else(|| path.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One aligned time point across all runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleRow {
    pub time_ps: f64,
    pub values: Vec<f64>,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

/// First row at which the spread across runs becomes large relative to the mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoff {
    pub row: usize,
    pub time_ps: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleSummary {
    pub labels: Vec<String>,
    pub rows: Vec<EnsembleRow>,
}

/// Mean, minimum, maximum and sample standard deviation at each row shared by all runs.
pub fn aggregate(runs: &[RunSeries]) -> ViscosityResult<EnsembleSummary> {
    let logger = LogManager::new("ensemble");
    if runs.is_empty() {
        return Err(ViscosityError::InvalidParameters(
            "at least one viscosity table is required".into(),
        ));
    }

    let common = runs.iter().map(|r| r.series.len()).min().unwrap_or(0);
    let longest = runs.iter().map(|r| r.series.len()).max().unwrap_or(0);
    if longest > common {
        logger.caution(&format!(
            "runs differ in length; keeping the {} rows present in every run",
            common
        ));
    }

    let mut rows = Vec::with_capacity(common);
    for i in 0..common {
        let time_ps = runs[0].series.points()[i].time_ps;
        let mut values = Vec::with_capacity(runs.len());
        for run in runs {
            let point = run.series.points()[i];
            if (point.time_ps - time_ps).abs() > TIME_TOLERANCE * time_ps.abs().max(1.0) {
                return Err(ViscosityError::InvalidParameters(format!(
                    "run {} has time {} ps at row {}, expected {} ps",
                    run.label, point.time_ps, i, time_ps
                )));
            }
            values.push(point.viscosity);
        }
        rows.push(EnsembleRow {
            time_ps,
            mean: StatsHelper::mean(&values),
            min: StatsHelper::min(&values),
            max: StatsHelper::max(&values),
            std: StatsHelper::sample_std(&values),
            values,
        });
    }

    logger.record(&format!(
        "aggregated {} runs over {} rows",
        runs.len(),
        rows.len()
    ));
    Ok(EnsembleSummary {
        labels: runs.iter().map(|r| r.label.clone()).collect(),
        rows,
    })
}

impl EnsembleSummary {
    /// First row after `skip` where `mean > 0` and `std >= fraction * mean`.
    pub fn cutoff(&self, fraction: f64, skip: usize) -> Option<Cutoff> {
        self.rows
            .iter()
            .enumerate()
            .skip(skip)
            .find(|(_, row)| row.mean > 0.0 && row.std >= fraction * row.mean)
            .map(|(row, r)| Cutoff {
                row,
                time_ps: r.time_ps,
            })
    }

    /// Writes `time(ps)`, `time(ns)`, one column per run, then the statistics.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> ViscosityResult<()> {
        let path = path.as_ref();
        let csv_err = |source| ViscosityError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

        let mut header = vec![TIME_COLUMN.to_string(), "time(ns)".to_string()];
        header.extend(
            self.labels
                .iter()
                .map(|label| format!("{} ({})", VISCOSITY_COLUMN, label)),
        );
        header.extend(
            ["mean_visc", "min_visc", "max_visc", "std_visc"]
                .iter()
                .map(|s| s.to_string()),
        );
        writer.write_record(&header).map_err(csv_err)?;

        for row in &self.rows {
            let mut record = vec![row.time_ps.to_string(), (row.time_ps / 1000.0).to_string()];
            record.extend(row.values.iter().map(|v| v.to_string()));
            record.extend([row.mean, row.min, row.max, row.std].iter().map(|v| v.to_string()));
            writer.write_record(&record).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| ViscosityError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use std::fs;
    use tempfile::tempdir;

    fn run(label: &str, values: &[f64]) -> RunSeries {
        let times = Array1::from_iter((0..values.len()).map(|i| i as f64 * 0.2));
        RunSeries {
            label: label.to_string(),
            series: ViscosityTimeSeries::from_parts(times.view(), Array1::from(values.to_vec()).view()),
        }
    }

    #[test]
    fn computes_row_statistics() {
        let runs = [run("a", &[0.0, 1.0, 2.0]), run("b", &[0.0, 3.0, 4.0])];
        let summary = aggregate(&runs).unwrap();
        assert_eq!(summary.rows.len(), 3);
        let row = &summary.rows[1];
        assert_eq!(row.values, vec![1.0, 3.0]);
        assert_eq!(row.mean, 2.0);
        assert_eq!(row.min, 1.0);
        assert_eq!(row.max, 3.0);
        assert!((row.std - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn keeps_common_prefix() {
        let runs = [run("a", &[1.0, 2.0, 3.0, 4.0]), run("b", &[1.0, 2.0])];
        assert_eq!(aggregate(&runs).unwrap().rows.len(), 2);
    }

    #[test]
    fn rejects_mismatched_time_axes() {
        let mut shifted = run("b", &[1.0, 2.0]);
        shifted.series = ViscosityTimeSeries::new(vec![
            ViscosityPoint { time_ps: 0.0, viscosity: 1.0 },
            ViscosityPoint { time_ps: 0.5, viscosity: 2.0 },
        ]);
        let runs = [run("a", &[1.0, 2.0]), shifted];
        assert!(aggregate(&runs).is_err());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            aggregate(&[]),
            Err(ViscosityError::InvalidParameters(_))
        ));
    }

    #[test]
    fn cutoff_finds_first_noisy_row_after_skip() {
        let runs = [
            run("a", &[10.0, 1.0, 1.0, 1.0, 1.0]),
            run("b", &[0.0, 1.0, 1.0, 1.5, 3.0]),
        ];
        let summary = aggregate(&runs).unwrap();
        // Row 0 is noisy but skipped; row 3 has std/mean ~0.28, row 4 ~0.71.
        let cutoff = summary.cutoff(0.4, 2).unwrap();
        assert_eq!(cutoff.row, 4);
        assert!((cutoff.time_ps - 0.8).abs() < 1e-12);
        assert!(summary.cutoff(0.9, 2).is_none());
    }

    #[test]
    fn loads_tables_and_writes_summary() {
        let temp = tempdir().unwrap();
        for (name, values) in [("NVT_1_data", "0.1,0.2"), ("NVT_2_data", "0.3,0.4")] {
            let dir = temp.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            let (a, b) = values.split_once(',').unwrap();
            fs::write(
                dir.join("viscosity_GK.csv"),
                format!("time(ps),viscosity(Pa.s)\n0.0,{}\n0.2,{}\n", a, b),
            )
            .unwrap();
        }
        let runs: Vec<RunSeries> = ["NVT_1_data", "NVT_2_data"]
            .iter()
            .map(|name| RunSeries::load(temp.path().join(name).join("viscosity_GK.csv")).unwrap())
            .collect();
        assert_eq!(runs[0].label, "NVT_1_data");

        let summary = aggregate(&runs).unwrap();
        let out = temp.path().join("avg_min_max_visc_GK.csv");
        summary.write_csv(&out).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "time(ps),time(ns),viscosity(Pa.s) (NVT_1_data),viscosity(Pa.s) (NVT_2_data),mean_visc,min_visc,max_visc,std_visc"
        );
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn missing_viscosity_column_is_schema_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bad.csv");
        fs::write(&path, "time(ps),ACF\n0.0,1.0\n").unwrap();
        match RunSeries::load(&path) {
            Err(ViscosityError::Schema { missing }) => {
                assert_eq!(missing, vec!["viscosity(Pa.s)"])
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }
}
