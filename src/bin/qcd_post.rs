//! Analysis CLI.
//!
//! Load an ensemble written by `qcd_exp`, optionally smear it, and compute the requested
//! observable.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::error;

use lattice_gauge_mc::gauge::settings::{from_json_file, AnalysisKind, PostSettings};
use lattice_gauge_mc::{Analysis, CustomObservable, GaugeMetropolis, Result};

#[derive(Parser)]
#[command(name = "qcd_post")]
#[command(about = "Estimate Wilson-loop observables on a stored ensemble")]
struct Cli {
    /// Post-processing settings (JSON)
    #[arg(short, long)]
    settings: PathBuf,
}

fn run(cli: Cli) -> Result<()> {
    let post: PostSettings = from_json_file(&cli.settings)?;
    let mut sampler = GaugeMetropolis::load(&post.input)?;

    if let Some(smearing) = post.smearing {
        sampler.spatial_smearing(smearing.times, smearing.parameter);
    }

    let analysis = match post.analysis {
        AnalysisKind::PlaquetteRectangle => Analysis::PlaquetteRectangle,
        AnalysisKind::QuarkPotential => Analysis::QuarkPotential {
            output_dir: Some(post.output_dir),
        },
        AnalysisKind::MeanLink => Analysis::Custom(CustomObservable::mean_link()),
    };
    let report = sampler.compute_statistics(&analysis)?;
    println!("{report}");
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
