use std::sync::Arc;

use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};

use crate::prelude::{ViscosityError, ViscosityResult};

/// Helper that wraps the `rustfft` planner for reuse across signals of one size.
pub struct FftHelper {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let scratch = vec![Complex64::zero(); scratch_len];
        Self {
            forward,
            inverse,
            scratch,
        }
    }

    fn len(&self) -> usize {
        self.forward.len()
    }

    /// Transforms a real signal, zero-padded to the planned size.
    pub fn forward(&mut self, input: ArrayView1<f64>) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input
            .iter()
            .map(|&value| Complex64::new(value, 0.0))
            .collect();
        buffer.resize(self.len(), Complex64::zero());

        self.forward
            .process_with_scratch(&mut buffer, &mut self.scratch);
        buffer
    }

    /// Inverse transform scaled by `1/size`, keeping only the real part.
    pub fn inverse_real(&mut self, mut spectrum: Vec<Complex64>) -> Vec<f64> {
        self.inverse
            .process_with_scratch(&mut spectrum, &mut self.scratch);
        let scale = 1.0 / self.len() as f64;
        spectrum.iter().map(|c| c.re * scale).collect()
    }
}

/// Smallest power of two that holds a linear (non-circular) correlation of `n` samples.
pub fn padded_len(n: usize) -> usize {
    (2 * n).saturating_sub(1).max(1).next_power_of_two()
}

/// FFT-based autocorrelation engine for signals of a fixed length.
///
/// Lag `k` is normalized by the `n - k` overlapping pairs and only lags
/// `0..n/2` are returned; the upper half of the lag range is discarded.
pub struct Autocorrelator {
    signal_len: usize,
    fft: FftHelper,
}

impl Autocorrelator {
    pub fn new(signal_len: usize) -> Self {
        Self {
            signal_len,
            fft: FftHelper::new(padded_len(signal_len)),
        }
    }

    pub fn compute(&mut self, signal: ArrayView1<f64>) -> ViscosityResult<Array1<f64>> {
        let n = signal.len();
        if n != self.signal_len {
            return Err(ViscosityError::InvalidParameters(format!(
                "autocorrelator planned for {} samples, got {}",
                self.signal_len, n
            )));
        }
        if n == 0 {
            return Ok(Array1::zeros(0));
        }

        let spectrum = self.fft.forward(signal);
        let power = spectrum.iter().map(|c| c * c.conj()).collect();
        let correlation = self.fft.inverse_real(power);

        let lags = n / 2;
        Ok(correlation
            .iter()
            .take(lags)
            .enumerate()
            .map(|(lag, &sum)| sum / (n - lag) as f64)
            .collect())
    }
}

/// One-shot autocorrelation of `signal`; see [`Autocorrelator`].
pub fn autocorrelation(signal: ArrayView1<f64>) -> Array1<f64> {
    let mut engine = Autocorrelator::new(signal.len());
    engine
        .compute(signal)
        .unwrap_or_else(|_| Array1::zeros(signal.len() / 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::stats::StatsHelper;
    use ndarray::array;

    fn naive_autocorrelation(signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        (0..n / 2)
            .map(|lag| {
                let sum: f64 = (0..n - lag).map(|i| signal[i] * signal[i + lag]).sum();
                sum / (n - lag) as f64
            })
            .collect()
    }

    #[test]
    fn fft_helper_returns_padded_length() {
        let mut helper = FftHelper::new(8);
        let output = helper.forward(array![1.0, 0.0, -1.0, 0.0].view());
        assert_eq!(output.len(), 8);
    }

    #[test]
    fn inverse_undoes_forward() {
        let mut helper = FftHelper::new(4);
        let input = array![1.0, 2.0, -3.0, 0.5];
        let spectrum = helper.forward(input.view());
        let restored = helper.inverse_real(spectrum);
        for (a, b) in input.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn padded_len_covers_linear_correlation() {
        assert_eq!(padded_len(1), 1);
        assert_eq!(padded_len(2), 4);
        assert_eq!(padded_len(4), 8);
        assert_eq!(padded_len(5), 16);
        assert_eq!(padded_len(1000), 2048);
    }

    #[test]
    fn output_length_is_half_the_signal() {
        for n in [0usize, 1, 2, 3, 7, 10, 33] {
            let signal = Array1::from_iter((0..n).map(|i| (i as f64 * 0.3).sin()));
            assert_eq!(autocorrelation(signal.view()).len(), n / 2);
        }
    }

    #[test]
    fn zero_lag_equals_mean_square() {
        let signal = array![1.5, -2.0, 0.25, 3.0, -1.0, 0.75, 2.5, -0.5];
        let acf = autocorrelation(signal.view());
        let expected = StatsHelper::mean_square(signal.as_slice().unwrap());
        assert!((acf[0] - expected).abs() < 1e-12 * expected.abs().max(1.0));
    }

    #[test]
    fn matches_direct_unbiased_sum() {
        let signal: Vec<f64> = (0..37)
            .map(|i| (i as f64 * 0.7).cos() + 0.1 * i as f64)
            .collect();
        let acf = autocorrelation(ArrayView1::from(&signal[..]));
        let expected = naive_autocorrelation(&signal);
        assert_eq!(acf.len(), expected.len());
        for (got, want) in acf.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-9, "{} vs {}", got, want);
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let signal = Array1::from_iter((0..64).map(|i| ((i * i) % 7) as f64 - 3.0));
        let mut engine = Autocorrelator::new(signal.len());
        let first = engine.compute(signal.view()).unwrap();
        let second = engine.compute(signal.view()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_mismatched_signal_length() {
        let mut engine = Autocorrelator::new(4);
        assert!(engine.compute(array![1.0, 2.0].view()).is_err());
    }
}
