use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use log::info;

use voxlabel::{Extraction, Label, read_volume, write_volume};

/// Extracts a set of labels from a segmentation volume and writes them out under a
/// single label.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "label-extract", version)]
struct Args {
    /// Input labelled volume (.nii, .nii.gz or .vlm)
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output labelled volume (.nii, .nii.gz or .vlm)
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Label to extract, repeat for several labels
    #[arg(short = 'l', long = "label", required = true)]
    labels: Vec<Label>,

    /// Label given to every extracted voxel
    #[arg(short = 'L', long = "output_label", alias = "output-label", default_value_t = 1)]
    output_label: Label,

    /// Keep voxels of labels that were not requested instead of clearing them
    #[arg(long, default_value_t = false)]
    keep_unselected: bool,

    /// Log per-label statistics and codec details
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let extraction = Extraction::new(args.labels.clone(), args.output_label)?
        .keep_unselected(args.keep_unselected);

    let grid = read_volume(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    info!(
        "Extracting labels {:?} into label {}",
        args.labels, args.output_label
    );

    let extracted = extraction.run(grid)?;

    write_volume(&args.output, &extracted.grid)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
