use ndarray::{Array1, ArrayView1};

/// Running trapezoidal integral with uniform spacing `dx` and a zero initial value.
///
/// The output has the same length as `y`; element `i` is the integral over
/// samples `0..=i`.
pub fn cumulative_trapezoid(y: ArrayView1<f64>, dx: f64) -> Array1<f64> {
    let mut out = Array1::zeros(y.len());
    let mut total = 0.0;
    for i in 1..y.len() {
        total += 0.5 * dx * (y[i - 1] + y[i]);
        out[i] = total;
    }
    out
}
