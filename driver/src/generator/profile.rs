use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use viscocore::output::write_table;

/// Configuration for generating a synthetic stress tensor table.
///
/// Each component is an independent Ornstein-Uhlenbeck process with
/// correlation time `tau` (in samples). Diagonal entries fluctuate around
/// `pressure`; off-diagonal entries around zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub steps: usize,
    pub tau: f64,
    pub amplitude: f64,
    pub pressure: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            steps: 2048,
            tau: 20.0,
            amplitude: 150.0,
            pressure: 1.0,
            seed: 0,
        }
    }
}

/// One row of the generated table, named like MD stress output.
#[derive(Debug, Clone, Copy, Serialize)]
struct StressRow {
    #[serde(rename = "Frame")]
    frame: usize,
    #[serde(rename = "StressXX")]
    xx: f64,
    #[serde(rename = "StressYY")]
    yy: f64,
    #[serde(rename = "StressZZ")]
    zz: f64,
    #[serde(rename = "StressXY")]
    xy: f64,
    #[serde(rename = "StressXZ")]
    xz: f64,
    #[serde(rename = "StressYZ")]
    yz: f64,
}

pub fn build_stress_rows(config: &GeneratorConfig) -> anyhow::Result<Vec<[f64; 6]>> {
    if !(config.tau.is_finite() && config.tau > 0.0) {
        anyhow::bail!("generator tau must be positive, got {}", config.tau);
    }

    let decay = (-1.0 / config.tau).exp();
    // Uniform noise on [-1, 1) scaled to unit variance.
    let kick = config.amplitude * (1.0 - decay * decay).sqrt() * 3f64.sqrt();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut state = [0.0f64; 6];
    for value in state.iter_mut() {
        *value = config.amplitude * rng.gen_range(-1.0..1.0);
    }

    let mut rows = Vec::with_capacity(config.steps);
    for _ in 0..config.steps {
        let mut row = state;
        for value in row.iter_mut().take(3) {
            *value += config.pressure;
        }
        rows.push(row);

        for value in state.iter_mut() {
            *value = decay * *value + kick * rng.gen_range(-1.0..1.0);
        }
    }
    Ok(rows)
}

pub fn write_stress_table(path: &Path, config: &GeneratorConfig) -> anyhow::Result<()> {
    let rows: Vec<StressRow> = build_stress_rows(config)?
        .iter()
        .enumerate()
        .map(|(frame, r)| StressRow {
            frame,
            xx: r[0],
            yy: r[1],
            zz: r[2],
            xy: r[3],
            xz: r[4],
            yz: r[5],
        })
        .collect();
    write_table(path, &rows)
        .with_context(|| format!("writing synthetic stress table {}", path.display()))
}
