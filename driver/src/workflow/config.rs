use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use viscocore::prelude::{PressureUnit, RunParameters};

/// Run options gathered from a YAML run file and/or command-line flags.
///
/// Every field is optional so that a partial file can be completed by flags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowConfig {
    pub unit: Option<PressureUnit>,
    pub steps: Option<usize>,
    pub timestep: Option<f64>,
    pub temperature: Option<f64>,
    pub volume: Option<f64>,
    pub include_diagonal: Option<bool>,
    pub plot: Option<bool>,
    pub each: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading run config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing run config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Fields set in `overrides` replace the ones in `self`.
    pub fn merge(self, overrides: WorkflowConfig) -> Self {
        Self {
            unit: overrides.unit.or(self.unit),
            steps: overrides.steps.or(self.steps),
            timestep: overrides.timestep.or(self.timestep),
            temperature: overrides.temperature.or(self.temperature),
            volume: overrides.volume.or(self.volume),
            include_diagonal: overrides.include_diagonal.or(self.include_diagonal),
            plot: overrides.plot.or(self.plot),
            each: overrides.each.or(self.each),
            output_dir: overrides.output_dir.or(self.output_dir),
        }
    }

    pub fn to_run_parameters(&self) -> anyhow::Result<RunParameters> {
        let steps = self.steps.ok_or_else(|| missing("steps"))?;
        let timestep = self.timestep.ok_or_else(|| missing("timestep"))?;
        let temperature = self.temperature.ok_or_else(|| missing("temperature"))?;
        let volume = self.volume.ok_or_else(|| missing("volume"))?;

        let mut params = RunParameters::new(steps, timestep, temperature, volume);
        if let Some(unit) = self.unit {
            params.unit = unit;
        }
        if let Some(include_diagonal) = self.include_diagonal {
            params.include_diagonal = include_diagonal;
        }
        if let Some(plot) = self.plot {
            params.plot = plot;
        }
        if let Some(each) = self.each {
            params.each = each;
        }
        params.validate().context("validating run parameters")?;
        Ok(params)
    }
}

fn missing(option: &str) -> anyhow::Error {
    anyhow!(
        "missing required option --{} (pass it as a flag or in the run config)",
        option
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn complete() -> WorkflowConfig {
        WorkflowConfig {
            steps: Some(1000),
            timestep: Some(0.002),
            temperature: Some(298.0),
            volume: Some(141_930.761),
            ..Default::default()
        }
    }

    #[test]
    fn config_with_required_fields_produces_parameters() {
        let params = complete().to_run_parameters().unwrap();
        assert_eq!(params.steps, 1000);
        assert_eq!(params.unit, PressureUnit::Atm);
        assert!(params.include_diagonal);
        assert_eq!(params.each, 100);
    }

    #[test]
    fn missing_required_field_is_reported() {
        let config = WorkflowConfig {
            volume: None,
            ..complete()
        };
        let err = config.to_run_parameters().unwrap_err();
        assert!(err.to_string().contains("--volume"));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let config = WorkflowConfig {
            temperature: Some(-5.0),
            ..complete()
        };
        assert!(config.to_run_parameters().is_err());
    }

    #[test]
    fn overrides_take_precedence() {
        let base = WorkflowConfig {
            unit: Some(PressureUnit::Bar),
            each: Some(10),
            ..complete()
        };
        let flags = WorkflowConfig {
            each: Some(5),
            include_diagonal: Some(false),
            ..Default::default()
        };
        let params = base.merge(flags).to_run_parameters().unwrap();
        assert_eq!(params.unit, PressureUnit::Bar);
        assert_eq!(params.each, 5);
        assert!(!params.include_diagonal);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"unit: GPa\nsteps: 1000001\ntimestep: 0.002\ntemperature: 298\nvolume: 141930.7610\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.unit, Some(PressureUnit::GPa));
        assert_eq!(cfg.steps, Some(1_000_001));
        assert_eq!(cfg.temperature, Some(298.0));
    }

    #[test]
    fn config_load_rejects_unknown_keys() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"steps: 10\nvolumes: 3\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
