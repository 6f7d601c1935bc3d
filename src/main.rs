use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use linetrace::snap::DEFAULT_SEARCH_RADIUS;
use linetrace::{
    extract_from_path, ExtractOptions, Fidelity, LatLon, LineSnapper, NoopSink, OverlaySink,
    Strategy, ValhallaMatcher, DEFAULT_VALHALLA_URL,
};

/// Trace lines in raster images and snap coordinates to a road network
#[derive(Parser, Debug)]
#[command(name = "linetrace")]
#[command(about = "Trace a single line from a raster image", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the curve passing through a seed pixel and print it as JSON
    Extract(ExtractArgs),
    /// Snap a JSON list of {"lat", "lon"} points onto roads through Valhalla
    Snap(SnapArgs),
}

#[derive(clap::Args, Debug)]
struct ExtractArgs {
    /// Input image file path
    input: PathBuf,

    /// Seed column, in pixels
    #[arg(long, allow_hyphen_values = true)]
    seed_x: i64,

    /// Seed row, in pixels
    #[arg(long, allow_hyphen_values = true)]
    seed_y: i64,

    #[arg(short, long, value_enum, default_value = "threshold")]
    mode: ModeArg,

    /// Simplification preset; overridden by --epsilon
    #[arg(short, long, value_enum, default_value = "fine")]
    fidelity: FidelityArg,

    /// Simplification tolerance as a fraction of the curve perimeter
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Maximum RGB distance to the seed color when growing the region
    #[arg(long)]
    growth_threshold: Option<f64>,

    /// Margin around the bounding box of the normalized geometry
    #[arg(short, long, default_value = "0")]
    padding: u32,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save mask, skeleton and selection overlays into this directory
    #[arg(short, long)]
    debug: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct SnapArgs {
    /// JSON file holding an array of {"lat", "lon"} points
    points: PathBuf,

    /// Base URL of the Valhalla server
    #[arg(short, long, default_value = DEFAULT_VALHALLA_URL)]
    url: String,

    /// Search radius around each point, in meters
    #[arg(short, long, default_value_t = DEFAULT_SEARCH_RADIUS)]
    search_radius: u32,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ModeArg {
    Threshold,
    Growth,
}

impl From<ModeArg> for Strategy {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Threshold => Strategy::ThresholdContour,
            ModeArg::Growth => Strategy::RegionGrowthGraph,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum FidelityArg {
    Fine,
    Standard,
    Coarse,
}

impl From<FidelityArg> for Fidelity {
    fn from(arg: FidelityArg) -> Self {
        match arg {
            FidelityArg::Fine => Fidelity::Fine,
            FidelityArg::Standard => Fidelity::Standard,
            FidelityArg::Coarse => Fidelity::Coarse,
        }
    }
}

impl ExtractArgs {
    fn options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::from_preset(self.mode.into(), self.fidelity.into());
        if let Some(epsilon) = self.epsilon {
            options.epsilon_fraction = epsilon;
        }
        if let Some(threshold) = self.growth_threshold {
            options.growth_threshold = threshold;
        }
        options.padding = self.padding;
        options
    }
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the JSON result.
    let _logger = Logger::try_with_env_or_str("info")?.start()?;

    match Cli::parse().command {
        Command::Extract(args) => run_extract(&args),
        Command::Snap(args) => run_snap(&args),
    }
}

fn run_extract(args: &ExtractArgs) -> Result<()> {
    let options = args.options();

    let extraction = match &args.debug {
        Some(dir) => {
            let mut sink = OverlaySink::new();
            let extraction =
                extract_from_path(&args.input, args.seed_x, args.seed_y, &options, &mut sink)
                    .with_context(|| format!("extracting from {}", args.input.display()))?;
            fs::create_dir_all(dir)
                .with_context(|| format!("creating debug directory {}", dir.display()))?;
            for (label, frame) in &sink.frames {
                let path = dir.join(format!("{label}.png"));
                frame.save(&path)?;
                log::info!("Saved {} overlay to {}", label, path.display());
            }
            extraction
        }
        None => extract_from_path(&args.input, args.seed_x, args.seed_y, &options, &mut NoopSink)
            .with_context(|| format!("extracting from {}", args.input.display()))?,
    };

    write_json(&extraction, args.output.as_deref())
}

fn run_snap(args: &SnapArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.points)
        .with_context(|| format!("reading {}", args.points.display()))?;
    let points: Vec<LatLon> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing points from {}", args.points.display()))?;

    let matcher = ValhallaMatcher::new(args.url.as_str())?;
    let snapped = LineSnapper::new(matcher)
        .with_search_radius(args.search_radius)
        .snap_points(&points);

    write_json(&snapped, args.output.as_deref())
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            log::info!("Wrote result to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
