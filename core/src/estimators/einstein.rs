use ndarray::Array1;

use crate::math::integrate::cumulative_trapezoid;
use crate::math::units::{MILLI, PICOSECOND};
use crate::prelude::{Estimate, Estimator, RunParameters, ViscosityResult};
use crate::records::{ViscosityPoint, ViscosityTimeSeries};
use crate::telemetry::log::LogManager;
use crate::trajectory::{StressComponent, Trajectory};

/// Einstein-relation estimator: viscosity from the growth of the squared
/// time-integrated shear stresses.
pub struct EinsteinEstimator {
    logger: LogManager,
}

impl EinsteinEstimator {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("einstein"),
        }
    }

    /// The five independent shear signals: the three off-diagonal entries
    /// plus `(XX-YY)/2` and `(YY-ZZ)/2`.
    pub fn shear_signals(trajectory: &Trajectory) -> Vec<Array1<f64>> {
        let mut signals: Vec<Array1<f64>> = StressComponent::SHEAR
            .iter()
            .map(|&c| trajectory.component(c).to_owned())
            .collect();
        signals.push(trajectory.half_difference(StressComponent::XX, StressComponent::YY));
        signals.push(trajectory.half_difference(StressComponent::YY, StressComponent::ZZ));
        signals
    }

    /// Average over the shear signals of the squared running integral, in (Pa·s)².
    pub fn mean_square_integral(trajectory: &Trajectory) -> Array1<f64> {
        let dt = trajectory.timestep_ps() * PICOSECOND;
        let signals = Self::shear_signals(trajectory);
        let mut total = Array1::<f64>::zeros(trajectory.len());
        for signal in &signals {
            let integral = cumulative_trapezoid(signal.view(), dt);
            total += &integral.mapv(|v| v * v);
        }
        total / signals.len() as f64
    }
}

impl Default for EinsteinEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for EinsteinEstimator {
    fn name(&self) -> &'static str {
        "Einstein"
    }

    fn estimate(
        &self,
        trajectory: &Trajectory,
        params: &RunParameters,
    ) -> ViscosityResult<Estimate> {
        params.validate()?;

        let integral = Self::mean_square_integral(trajectory);
        let times = trajectory.time_axis_ps();
        let prefactor = params.volume_m3() / (2.0 * params.kbt());

        // t = 0 carries no information (0/0), so the series starts at the second sample.
        let points = times
            .iter()
            .zip(integral.iter())
            .skip(1)
            .map(|(&time_ps, &value)| ViscosityPoint {
                time_ps,
                viscosity: value * prefactor / (time_ps * PICOSECOND),
            })
            .collect();
        let series = ViscosityTimeSeries::new(points);

        let mut notes = Vec::new();
        match series.last() {
            Some(last) => {
                let note = format!(
                    "Viscosity (Einstein): {:.2} [mPa.s]",
                    last.viscosity * MILLI
                );
                self.logger.record(&note);
                notes.push(note);
            }
            None => self
                .logger
                .caution("trajectory too short for an Einstein estimate"),
        }

        Ok(Estimate {
            series,
            acf: None,
            notes,
        })
    }
}
