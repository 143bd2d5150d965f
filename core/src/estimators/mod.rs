pub mod einstein;
pub mod green_kubo;

pub use einstein::EinsteinEstimator;
pub use green_kubo::GreenKuboEstimator;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::trajectory::Trajectory;

    /// Deterministic, mildly decorrelating stress rows for estimator tests.
    pub fn wavy_trajectory(n: usize, timestep_ps: f64) -> Trajectory {
        let rows: Vec<[f64; 6]> = (0..n)
            .map(|i| {
                let t = i as f64;
                [
                    1.0e5 + 300.0 * (0.31 * t).sin(),
                    1.0e5 - 250.0 * (0.17 * t).cos(),
                    1.0e5 + 120.0 * (0.53 * t).sin(),
                    400.0 * (0.23 * t).sin(),
                    -150.0 * (0.41 * t).cos() + 30.0 * (0.07 * t).sin(),
                    220.0 * (0.11 * t + 0.4).sin(),
                ]
            })
            .collect();
        Trajectory::from_rows(&rows, timestep_ps).unwrap()
    }
}
