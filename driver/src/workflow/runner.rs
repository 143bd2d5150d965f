use anyhow::Context;
use log::info;
use std::path::{Path, PathBuf};
use viscocore::estimators::{EinsteinEstimator, GreenKuboEstimator};
use viscocore::ingest::{load_trajectory, IngestReport};
use viscocore::output::{write_run, RunSummary, RunTables};
use viscocore::prelude::{Estimate, Estimator, RunParameters};
use viscocore::records::AcfSeries;
use viscocore::Trajectory;

pub struct WorkflowResult {
    pub ingest: IngestReport,
    pub einstein: Estimate,
    pub green_kubo: Estimate,
    pub summary: RunSummary,
}

impl WorkflowResult {
    pub fn acf(&self) -> AcfSeries {
        self.green_kubo.acf.clone().unwrap_or_default()
    }
}

/// Ingestion followed by both estimators over one trajectory.
#[derive(Clone)]
pub struct Runner {
    params: RunParameters,
}

impl Runner {
    pub fn new(params: RunParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    pub fn execute(&self, datafile: &Path) -> anyhow::Result<WorkflowResult> {
        let (trajectory, ingest) = load_trajectory(datafile, &self.params)
            .with_context(|| format!("ingesting {}", datafile.display()))?;

        let einstein = run_estimator(&EinsteinEstimator::new(), &trajectory, &self.params)?;
        let green_kubo = run_estimator(&GreenKuboEstimator::new(), &trajectory, &self.params)?;

        let summary = RunSummary {
            datafile: datafile.display().to_string(),
            parameters: self.params.clone(),
            ingest,
            simulated_time_ps: trajectory.duration_ps(),
            einstein_final: einstein.series.last().map(|p| p.viscosity),
            green_kubo_final: green_kubo.series.last().map(|p| p.viscosity),
        };

        Ok(WorkflowResult {
            ingest,
            einstein,
            green_kubo,
            summary,
        })
    }

    /// Writes the down-sampled tables of a completed run into `dir`.
    pub fn write(&self, result: &WorkflowResult, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let acf = result.acf();
        let tables = RunTables {
            einstein: &result.einstein.series,
            green_kubo: &result.green_kubo.series,
            acf: &acf,
            summary: &result.summary,
        };
        write_run(dir, &tables, self.params.each)
            .with_context(|| format!("writing results to {}", dir.display()))
    }
}

fn run_estimator<E: Estimator>(
    estimator: &E,
    trajectory: &Trajectory,
    params: &RunParameters,
) -> anyhow::Result<Estimate> {
    info!(
        "running {} estimator over {} samples",
        estimator.name(),
        trajectory.len()
    );
    estimator
        .estimate(trajectory, params)
        .with_context(|| format!("executing {} estimator", estimator.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{write_stress_table, GeneratorConfig};
    use std::fs;
    use tempfile::tempdir;
    use viscocore::output::{ACF_TABLE, EINSTEIN_TABLE, GREEN_KUBO_TABLE};
    use viscocore::prelude::{PressureUnit, ViscosityError};

    fn params(unit: PressureUnit) -> RunParameters {
        RunParameters {
            unit,
            each: 10,
            ..RunParameters::new(400, 0.002, 298.0, 141_930.761)
        }
    }

    #[test]
    fn runner_executes_workflow() {
        let temp = tempdir().unwrap();
        let data = temp.path().join("NVT_1_stress_tensor.csv");
        let generator = GeneratorConfig {
            steps: 500,
            ..Default::default()
        };
        write_stress_table(&data, &generator).unwrap();

        let runner = Runner::new(params(PressureUnit::Atm));
        let result = runner.execute(&data).unwrap();
        assert_eq!(result.ingest.rows_read, 400);
        assert_eq!(result.einstein.series.len(), 399);
        assert_eq!(result.green_kubo.series.len(), 200);
        assert_eq!(result.acf().len(), 200);

        let out = temp.path().join("NVT_1_stress_tensor_data");
        let written = runner.write(&result, &out).unwrap();
        assert_eq!(written.len(), 4);

        let einstein = fs::read_to_string(out.join(EINSTEIN_TABLE)).unwrap();
        assert_eq!(einstein.lines().count(), 1 + 40);
        let gk = fs::read_to_string(out.join(GREEN_KUBO_TABLE)).unwrap();
        assert_eq!(gk.lines().count(), 1 + 20);
        let acf = fs::read_to_string(out.join(ACF_TABLE)).unwrap();
        assert_eq!(acf.lines().count(), 1 + 200);
    }

    #[test]
    fn pascal_and_atm_inputs_agree() {
        let temp = tempdir().unwrap();
        let atm_path = temp.path().join("atm.csv");
        let pa_path = temp.path().join("pa.csv");

        let header = "Frame,StressXX,StressYY,StressZZ,StressXY,StressXZ,StressYZ\n";
        let mut atm = header.to_string();
        let mut pa = header.to_string();
        for i in 0..64 {
            let t = i as f64;
            let row = [
                1.0 + (0.3 * t).sin(),
                0.5 * (0.2 * t).cos(),
                -0.25 * (0.7 * t).sin(),
                (0.11 * t).sin(),
                0.8 * (0.05 * t).cos(),
                -(0.19 * t).sin(),
            ];
            let atm_fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            let pa_fields: Vec<String> = row.iter().map(|v| (v * 101_325.0).to_string()).collect();
            atm.push_str(&format!("{},{}\n", i, atm_fields.join(",")));
            pa.push_str(&format!("{},{}\n", i, pa_fields.join(",")));
        }
        fs::write(&atm_path, atm).unwrap();
        fs::write(&pa_path, pa).unwrap();

        let from_atm = Runner::new(params(PressureUnit::Atm)).execute(&atm_path).unwrap();
        let from_pa = Runner::new(params(PressureUnit::Pa)).execute(&pa_path).unwrap();
        assert_eq!(from_atm.einstein.series, from_pa.einstein.series);
        assert_eq!(from_atm.green_kubo.series, from_pa.green_kubo.series);
    }

    #[test]
    fn estimator_failures_name_the_estimator() {
        let traj = Trajectory::from_rows(&[[1.0; 6]; 8], 1.0).unwrap();
        let mut bad = params(PressureUnit::Pa);
        bad.each = 0;

        let err = run_estimator(&EinsteinEstimator::new(), &traj, &bad)
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "executing Einstein estimator");
        let err = run_estimator(&GreenKuboEstimator::new(), &traj, &bad)
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "executing Green-Kubo estimator");
    }

    #[test]
    fn failed_ingestion_writes_nothing() {
        let temp = tempdir().unwrap();
        let data = temp.path().join("broken.csv");
        fs::write(&data, "Frame,StressXX,StressYY,StressZZ,StressXY,StressXZ\n0,1,2,3,4,5\n")
            .unwrap();

        let runner = Runner::new(params(PressureUnit::Pa));
        let err = runner.execute(&data).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ViscosityError>(),
            Some(ViscosityError::Schema { .. })
        ));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }
}
