use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use generator::profile::{write_stress_table, GeneratorConfig};
use log::{info, warn};
use std::path::PathBuf;
use viscocore::ensemble::{aggregate, RunSeries};
use viscocore::output::output_dir_for;
use viscocore::prelude::PressureUnit;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Shear viscosity from molecular-dynamics stress tensor trajectories"
)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Einstein and Green-Kubo viscosity from one stress tensor table
    Run(RunArgs),
    /// Row-wise mean/min/max/std across viscosity tables of repeated runs
    Aggregate(AggregateArgs),
    /// Write a synthetic stress tensor table
    Synth(SynthArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Stress tensor CSV: Frame (optional), StressXX, StressYY, StressZZ, StressXY, StressXZ, StressYZ
    datafile: PathBuf,
    /// Unit of the stress data: Pa, atm, bar or GPa [default: atm]
    #[arg(short, long)]
    unit: Option<PressureUnit>,
    /// Number of rows to read from the stress table
    #[arg(short, long)]
    steps: Option<usize>,
    /// Time between two successive rows in ps
    #[arg(short, long)]
    timestep: Option<f64>,
    /// Temperature of the NVT simulation in K
    #[arg(short = 'T', long)]
    temperature: Option<f64>,
    /// Volume of the simulation box in Å^3
    #[arg(short, long)]
    volume: Option<f64>,
    /// Exclude the diagonal combinations from the Green-Kubo average
    #[arg(short = 'd', long = "no-diag", default_value_t = false)]
    no_diag: bool,
    /// Request diagnostic plots
    #[arg(short, long, default_value_t = false)]
    plot: bool,
    /// Keep every n-th point of the written viscosity series [default: 100]
    #[arg(short, long)]
    each: Option<usize>,
    /// YAML run file providing any of the options above
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory under which `<datafile stem>_data` is created
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

impl RunArgs {
    fn to_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            unit: self.unit,
            steps: self.steps,
            timestep: self.timestep,
            temperature: self.temperature,
            volume: self.volume,
            include_diagonal: self.no_diag.then_some(false),
            plot: self.plot.then_some(true),
            each: self.each,
            output_dir: self.output_dir.clone(),
        }
    }
}

#[derive(Args)]
struct AggregateArgs {
    /// viscosity_Einstein.csv or viscosity_GK.csv tables, one per run
    #[arg(required = true, num_args = 1..)]
    tables: Vec<PathBuf>,
    /// Summary table to write
    #[arg(short, long)]
    output: PathBuf,
    /// Relative spread std/mean that marks the cutoff row
    #[arg(long, default_value_t = 0.4)]
    fraction: f64,
    /// Leading rows ignored when searching for the cutoff
    #[arg(long, default_value_t = 2)]
    skip: usize,
}

#[derive(Args)]
struct SynthArgs {
    /// Output CSV path
    output: PathBuf,
    #[arg(short, long, default_value_t = 2048)]
    steps: usize,
    /// Correlation time in samples
    #[arg(long, default_value_t = 20.0)]
    tau: f64,
    /// Fluctuation amplitude in table units
    #[arg(long, default_value_t = 150.0)]
    amplitude: f64,
    /// Mean of the diagonal entries in table units
    #[arg(long, default_value_t = 1.0)]
    pressure: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Run(args) => run(args),
        Command::Aggregate(args) => run_aggregate(args),
        Command::Synth(args) => run_synth(args),
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let base = match &args.config {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    };
    let config = base.merge(args.to_config());
    let params = config.to_run_parameters()?;

    let runner = Runner::new(params);
    let result = runner.execute(&args.datafile)?;
    if result.ingest.rows_skipped > 0 {
        warn!(
            "skipped {} malformed rows in {}",
            result.ingest.rows_skipped,
            args.datafile.display()
        );
    }

    if runner.params().plot {
        warn!("plots are not rendered by visco; plot the CSV tables with downstream tooling");
    }

    let dir = output_dir_for(&args.datafile, config.output_dir.as_deref());
    runner.write(&result, &dir)?;

    for note in result
        .einstein
        .notes
        .iter()
        .chain(result.green_kubo.notes.iter())
    {
        println!("{}", note);
    }
    println!("Results written to {}", dir.display());
    Ok(())
}

fn run_aggregate(args: AggregateArgs) -> anyhow::Result<()> {
    let runs = args
        .tables
        .iter()
        .map(|path| {
            RunSeries::load(path).with_context(|| format!("loading {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let summary = aggregate(&runs).context("aggregating runs")?;
    summary
        .write_csv(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!(
        "Summary of {} runs ({} rows) written to {}",
        runs.len(),
        summary.rows.len(),
        args.output.display()
    );

    match summary.cutoff(args.fraction, args.skip) {
        Some(cutoff) => println!(
            "Row {} exceeds {:.0}% threshold at time {} ns.",
            cutoff.row,
            args.fraction * 100.0,
            cutoff.time_ps / 1000.0
        ),
        None => println!(
            "No time point where std_visc reaches {:.0}% of mean_visc.",
            args.fraction * 100.0
        ),
    }
    Ok(())
}

fn run_synth(args: SynthArgs) -> anyhow::Result<()> {
    let config = GeneratorConfig {
        steps: args.steps,
        tau: args.tau,
        amplitude: args.amplitude,
        pressure: args.pressure,
        seed: args.seed,
    };
    write_stress_table(&args.output, &config)?;
    info!(
        "wrote {} synthetic rows to {}",
        config.steps,
        args.output.display()
    );
    Ok(())
}
