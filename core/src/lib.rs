//! Core estimators for shear viscosity from molecular-dynamics stress tensors.
//!
//! A stress-tensor trajectory is ingested once, then handed to the Einstein
//! and Green-Kubo estimators. Both produce a running viscosity series that the
//! output layer writes as tables for downstream aggregation.

pub mod ensemble;
pub mod estimators;
pub mod ingest;
pub mod math;
pub mod output;
pub mod prelude;
pub mod records;
pub mod telemetry;
pub mod trajectory;

pub use prelude::{Estimate, Estimator, RunParameters, ViscosityError, ViscosityResult};
pub use trajectory::{StressComponent, Trajectory};
