use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use crate::math::units::PressureUnit;
use crate::math::units::{BOLTZMANN, CUBIC_ANGSTROM, PICOSECOND};
use crate::records::{AcfSeries, ViscosityTimeSeries};
use crate::trajectory::Trajectory;

fn default_include_diagonal() -> bool {
    true
}

fn default_each() -> usize {
    100
}

/// Physical and sampling parameters of a single estimator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    #[serde(default)]
    pub unit: PressureUnit,
    /// Maximum number of rows consumed from the input table.
    pub steps: usize,
    /// Spacing between samples in ps.
    pub timestep: f64,
    /// Temperature in K.
    pub temperature: f64,
    /// Box volume in Å³.
    pub volume: f64,
    #[serde(default = "default_include_diagonal")]
    pub include_diagonal: bool,
    #[serde(default)]
    pub plot: bool,
    /// Down-sampling stride applied to the written viscosity series.
    #[serde(default = "default_each")]
    pub each: usize,
}

impl RunParameters {
    pub fn new(steps: usize, timestep: f64, temperature: f64, volume: f64) -> Self {
        Self {
            unit: PressureUnit::default(),
            steps,
            timestep,
            temperature,
            volume,
            include_diagonal: default_include_diagonal(),
            plot: false,
            each: default_each(),
        }
    }

    pub fn validate(&self) -> ViscosityResult<()> {
        if self.steps == 0 {
            return Err(ViscosityError::InvalidParameters(
                "steps must be greater than zero".into(),
            ));
        }
        let positive = [
            ("timestep", self.timestep),
            ("temperature", self.temperature),
            ("volume", self.volume),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ViscosityError::InvalidParameters(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.each == 0 {
            return Err(ViscosityError::InvalidParameters(
                "each must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Thermal energy in J.
    pub fn kbt(&self) -> f64 {
        BOLTZMANN * self.temperature
    }

    pub fn volume_m3(&self) -> f64 {
        self.volume * CUBIC_ANGSTROM
    }

    pub fn timestep_s(&self) -> f64 {
        self.timestep * PICOSECOND
    }
}

/// Result of one estimator over a full-resolution trajectory.
#[derive(Debug, Clone)]
pub struct Estimate {
    pub series: ViscosityTimeSeries,
    /// Normalized average ACF, only produced by correlation-based estimators.
    pub acf: Option<AcfSeries>,
    pub notes: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ViscosityError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("row {row}: column {column} has a missing or non-numeric value {value:?}")]
    Data {
        row: u64,
        column: String,
        value: String,
    },
    #[error("no data rows found in {origin}")]
    EmptyData { origin: String },
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("table error for {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("summary serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ViscosityResult<T> = Result<T, ViscosityError>;

/// A viscosity estimator over an ingested stress-tensor trajectory.
pub trait Estimator {
    fn name(&self) -> &'static str;
    fn estimate(&self, trajectory: &Trajectory, params: &RunParameters)
        -> ViscosityResult<Estimate>;
}
