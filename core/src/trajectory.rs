use std::fmt;

use ndarray::{Array1, Array2, ArrayView1};

use crate::prelude::{ViscosityError, ViscosityResult};

/// One of the six independent entries of the symmetric stress tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StressComponent {
    XX,
    YY,
    ZZ,
    XY,
    XZ,
    YZ,
}

impl StressComponent {
    /// Storage order of the components in a [`Trajectory`].
    pub const ALL: [StressComponent; 6] = [
        StressComponent::XX,
        StressComponent::YY,
        StressComponent::ZZ,
        StressComponent::XY,
        StressComponent::XZ,
        StressComponent::YZ,
    ];

    pub const SHEAR: [StressComponent; 3] =
        [StressComponent::XY, StressComponent::XZ, StressComponent::YZ];

    /// Header of the column holding this component in the input table.
    pub fn column_name(self) -> &'static str {
        match self {
            StressComponent::XX => "StressXX",
            StressComponent::YY => "StressYY",
            StressComponent::ZZ => "StressZZ",
            StressComponent::XY => "StressXY",
            StressComponent::XZ => "StressXZ",
            StressComponent::YZ => "StressYZ",
        }
    }

    fn index(self) -> usize {
        match self {
            StressComponent::XX => 0,
            StressComponent::YY => 1,
            StressComponent::ZZ => 2,
            StressComponent::XY => 3,
            StressComponent::XZ => 4,
            StressComponent::YZ => 5,
        }
    }
}

impl fmt::Display for StressComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Immutable stress-tensor time series in Pa, one row per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    samples: Array2<f64>,
    timestep_ps: f64,
}

impl Trajectory {
    /// Wraps an `(n, 6)` array whose columns follow [`StressComponent::ALL`].
    pub fn from_samples(samples: Array2<f64>, timestep_ps: f64) -> ViscosityResult<Self> {
        if samples.ncols() != StressComponent::ALL.len() {
            return Err(ViscosityError::InvalidParameters(format!(
                "trajectory needs {} stress columns, got {}",
                StressComponent::ALL.len(),
                samples.ncols()
            )));
        }
        if !(timestep_ps.is_finite() && timestep_ps > 0.0) {
            return Err(ViscosityError::InvalidParameters(format!(
                "timestep must be positive, got {}",
                timestep_ps
            )));
        }
        Ok(Self {
            samples,
            timestep_ps,
        })
    }

    pub fn from_rows(rows: &[[f64; 6]], timestep_ps: f64) -> ViscosityResult<Self> {
        let flat: Vec<f64> = rows.iter().flat_map(|row| row.iter().copied()).collect();
        let samples = Array2::from_shape_vec((rows.len(), 6), flat)
            .map_err(|e| ViscosityError::InvalidParameters(e.to_string()))?;
        Self::from_samples(samples, timestep_ps)
    }

    pub fn len(&self) -> usize {
        self.samples.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn timestep_ps(&self) -> f64 {
        self.timestep_ps
    }

    pub fn component(&self, component: StressComponent) -> ArrayView1<'_, f64> {
        self.samples.column(component.index())
    }

    /// `(a - b) / 2`, the traceless shear combination of two diagonal entries.
    pub fn half_difference(&self, a: StressComponent, b: StressComponent) -> Array1<f64> {
        (&self.component(a) - &self.component(b)) / 2.0
    }

    /// Sample times in ps: point `i` sits at `i * timestep`.
    pub fn time_axis_ps(&self) -> Array1<f64> {
        Array1::from_iter((0..self.len()).map(|i| i as f64 * self.timestep_ps))
    }

    /// Total simulated time covered by the samples, in ps.
    pub fn duration_ps(&self) -> f64 {
        self.len() as f64 * self.timestep_ps
    }
}
