pub mod fft;
pub mod integrate;
pub mod stats;
pub mod units;

pub use fft::{autocorrelation, Autocorrelator, FftHelper};
pub use integrate::cumulative_trapezoid;
pub use stats::StatsHelper;
pub use units::PressureUnit;
