use ndarray::{s, Array1};

use crate::math::fft::Autocorrelator;
use crate::math::integrate::cumulative_trapezoid;
use crate::math::units::{MILLI, PICOSECOND};
use crate::prelude::{Estimate, Estimator, RunParameters, ViscosityResult};
use crate::records::{AcfSeries, ViscosityTimeSeries};
use crate::telemetry::log::LogManager;
use crate::trajectory::{StressComponent, Trajectory};

/// Green-Kubo estimator: viscosity as the running integral of the averaged
/// shear-stress autocorrelation function.
///
/// The value at the last lag is not the converged viscosity. The series has
/// to be fitted with a saturating curve and read at its plateau.
pub struct GreenKuboEstimator {
    logger: LogManager,
}

impl GreenKuboEstimator {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("green-kubo"),
        }
    }

    /// Off-diagonal signals, followed by `(XX-YY)/2`, `(YY-ZZ)/2` and
    /// `(XX-ZZ)/2` when the diagonal is included.
    pub fn shear_signals(trajectory: &Trajectory, include_diagonal: bool) -> Vec<Array1<f64>> {
        let mut signals: Vec<Array1<f64>> = StressComponent::SHEAR
            .iter()
            .map(|&c| trajectory.component(c).to_owned())
            .collect();
        if include_diagonal {
            use StressComponent::{XX, YY, ZZ};
            signals.push(trajectory.half_difference(XX, YY));
            signals.push(trajectory.half_difference(YY, ZZ));
            signals.push(trajectory.half_difference(XX, ZZ));
        }
        signals
    }

    /// Element-wise mean of the ACFs of the shear signals, `len / 2` lags long.
    pub fn average_acf(
        trajectory: &Trajectory,
        include_diagonal: bool,
    ) -> ViscosityResult<Array1<f64>> {
        let signals = Self::shear_signals(trajectory, include_diagonal);
        let mut engine = Autocorrelator::new(trajectory.len());
        let mut total = Array1::<f64>::zeros(trajectory.len() / 2);
        for signal in &signals {
            total += &engine.compute(signal.view())?;
        }
        Ok(total / signals.len() as f64)
    }
}

impl Default for GreenKuboEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for GreenKuboEstimator {
    fn name(&self) -> &'static str {
        "Green-Kubo"
    }

    fn estimate(
        &self,
        trajectory: &Trajectory,
        params: &RunParameters,
    ) -> ViscosityResult<Estimate> {
        params.validate()?;

        let acf = Self::average_acf(trajectory, params.include_diagonal)?;
        self.logger.detail(&format!(
            "averaged {} ACFs over {} lags",
            if params.include_diagonal { 6 } else { 3 },
            acf.len()
        ));

        let dt = trajectory.timestep_ps() * PICOSECOND;
        let viscosity = cumulative_trapezoid(acf.view(), dt) * (params.volume_m3() / params.kbt());
        let times = trajectory.time_axis_ps();
        let lag_times = times.slice(s![..acf.len()]);

        let series = ViscosityTimeSeries::from_parts(lag_times, viscosity.view());
        let normalized = AcfSeries::normalized(lag_times, acf.view());

        let mut notes = Vec::new();
        match series.last() {
            Some(last) => {
                let note = format!(
                    "Viscosity (Green-Kubo): {:.2} [mPa.s]",
                    last.viscosity * MILLI
                );
                self.logger.record(&note);
                notes.push(note);
                let caution = "the final running integral is not the converged viscosity; \
                               fit a saturating curve to the series and take its limit";
                self.logger.caution(caution);
                notes.push(caution.to_string());
            }
            None => self
                .logger
                .caution("trajectory too short for a Green-Kubo estimate"),
        }

        Ok(Estimate {
            series,
            acf: Some(normalized),
            notes,
        })
    }
}
