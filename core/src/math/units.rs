use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Boltzmann constant in J/K (exact SI value).
pub const BOLTZMANN: f64 = 1.380_649e-23;
/// Seconds per picosecond.
pub const PICOSECOND: f64 = 1e-12;
/// Cubic metres per cubic ångström.
pub const CUBIC_ANGSTROM: f64 = 1e-30;
/// Pa·s to mPa·s, for reporting only.
pub const MILLI: f64 = 1e3;

/// Pressure unit of the raw stress table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureUnit {
    #[serde(rename = "Pa", alias = "pa")]
    Pa,
    #[default]
    #[serde(rename = "atm", alias = "ATM")]
    Atm,
    #[serde(rename = "bar", alias = "BAR")]
    Bar,
    #[serde(rename = "GPa", alias = "gpa")]
    GPa,
}

impl PressureUnit {
    /// Multiplier converting a value in this unit to pascals.
    pub fn to_pascal(self) -> f64 {
        match self {
            PressureUnit::Pa => 1.0,
            PressureUnit::Atm => 101_325.0,
            PressureUnit::Bar => 100_000.0,
            PressureUnit::GPa => 1e9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PressureUnit::Pa => "Pa",
            PressureUnit::Atm => "atm",
            PressureUnit::Bar => "bar",
            PressureUnit::GPa => "GPa",
        }
    }
}

impl fmt::Display for PressureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PressureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pa" => Ok(PressureUnit::Pa),
            "atm" => Ok(PressureUnit::Atm),
            "bar" => Ok(PressureUnit::Bar),
            "gpa" => Ok(PressureUnit::GPa),
            other => Err(format!(
                "unknown pressure unit '{}' (expected Pa, atm, bar or GPa)",
                other
            )),
        }
    }
}
