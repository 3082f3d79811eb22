//! Sampling CLI.
//!
//! Run a Metropolis experiment from a JSON settings file and write the ensemble to disk.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use lattice_gauge_mc::gauge::settings::{from_json_file, save_json, ExperimentSettings};
use lattice_gauge_mc::{GaugeMetropolis, Result};

#[derive(Parser)]
#[command(name = "qcd_exp")]
#[command(about = "Sample SU(3) gauge configurations with the Metropolis algorithm")]
struct Cli {
    /// Experiment settings (JSON)
    #[arg(short, long)]
    settings: PathBuf,

    /// Override the output ensemble file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<()> {
    let mut exp: ExperimentSettings = from_json_file(&cli.settings)?;
    if let Some(output) = cli.output {
        exp.output = output;
    }

    let mut sampler = GaugeMetropolis::from_settings(exp.sampler)?;
    let summary = sampler.run()?;
    println!(
        "Mean acceptance: {:.4} over {} sweeps",
        summary.mean_acceptance, summary.sampling_sweeps
    );

    sampler.save(&exp.output)?;
    if let Some(verbose) = exp.verbose_output {
        sampler.save_verbose(&verbose)?;
        info!("readable ensemble written to {}", verbose.display());
    }
    if let Some(path) = exp.summary_output {
        save_json(&summary, &path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let start = Instant::now();

    let outcome = run(Cli::parse());
    println!("Execution time: {:.3} min", start.elapsed().as_secs_f64() / 60.0);

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
