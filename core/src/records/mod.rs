pub mod series;

pub use series::{AcfPoint, AcfSeries, ViscosityPoint, ViscosityTimeSeries};
