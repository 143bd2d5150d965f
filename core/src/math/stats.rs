pub struct StatsHelper;

impl StatsHelper {
    /// Mean of squares (second moment about zero).
    pub fn mean_square(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(|&v| v * v).sum::<f64>() / samples.len() as f64
    }

    pub fn mean(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    pub fn min(samples: &[f64]) -> f64 {
        samples.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(samples: &[f64]) -> f64 {
        samples.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Sample standard deviation (n - 1 denominator); zero below two samples.
    pub fn sample_std(samples: &[f64]) -> f64 {
        if samples.len() < 2 {
            return 0.0;
        }
        let mean = Self::mean(samples);
        let sum_sq: f64 = samples.iter().map(|&v| (v - mean) * (v - mean)).sum();
        (sum_sq / (samples.len() - 1) as f64).sqrt()
    }
}
