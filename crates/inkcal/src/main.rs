//! inkcal: calibrate dot-stamp pressures against line strokes.
//!
//! Scans a folder of aligned probe (line) and candidate (dot) images,
//! matches every probe against every candidate inside a fixed region of
//! interest and writes one CSV row per probe, plus optional diagnostic
//! PNGs.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin inkcal -- [OPTIONS] <FOLDER>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use inkcal_io::{ClassifierConfig, DEFAULT_LUT_PATH, DEFAULT_TABLE_NAME, RunOptions};
use inkcal_match::{Clock, MatchConfig, Roi};

/// Ink footprint calibration.
///
/// Matches probe line images against candidate dot-stamp images by
/// binary footprint overlap and writes the calibration table.
#[derive(Parser)]
#[command(name = "inkcal", version)]
struct Cli {
    /// Folder holding the probe and candidate PNGs.
    folder: PathBuf,

    /// CSV destination [default: <FOLDER>/footprint-calibration.csv].
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Write diagnostic heatmaps and difference maps into this folder.
    #[arg(long)]
    png_dir: Option<PathBuf>,

    /// GIMP curve file with the alpha LUT [default: <FOLDER>/LUT/Dot P1 LUT.crv].
    #[arg(long, conflicts_with = "no_lut")]
    lut: Option<PathBuf>,

    /// Do not load any alpha LUT.
    #[arg(long)]
    no_lut: bool,

    /// Remap candidate alpha through the LUT before matching.
    #[arg(long)]
    remap_candidates: bool,

    /// ROI width in pixels.
    #[arg(long, default_value_t = Roi::DEFAULT_WIDTH)]
    roi_width: u32,

    /// First ROI row.
    #[arg(long, default_value_t = Roi::DEFAULT_Y0)]
    roi_y0: u32,

    /// ROI end row (exclusive).
    #[arg(long, default_value_t = Roi::DEFAULT_Y1)]
    roi_y1: u32,

    /// Binarization thresholds, in processing order.
    #[arg(long, value_delimiter = ',', default_values_t = MatchConfig::DEFAULT_THRESHOLDS)]
    thresholds: Vec<u8>,

    /// Probes with fewer on-pixels at threshold 1 are matched at threshold 0.
    #[arg(long, default_value_t = MatchConfig::DEFAULT_RELAX_FLOOR_PX)]
    relax_floor: u64,

    /// Weight of an under-covered pixel in the over/under score.
    #[arg(long, default_value_t = MatchConfig::DEFAULT_UNDER_WEIGHT)]
    under_weight: u64,

    /// Full match config as a JSON string.
    ///
    /// When provided, the ROI, threshold, relax, weight and remap flags are
    /// ignored. Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Filename role markers as a JSON string.
    #[arg(long)]
    classifier_json: Option<String>,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,
}

/// Build a [`MatchConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<MatchConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(MatchConfig {
        roi: Roi {
            width: cli.roi_width,
            y0: cli.roi_y0,
            y1: cli.roi_y1,
            ..Roi::default()
        },
        thresholds: cli.thresholds.clone(),
        relax_floor_px: cli.relax_floor,
        under_weight: cli.under_weight,
        remap_candidates: cli.remap_candidates,
        ..MatchConfig::default()
    })
}

fn options_from_cli(cli: &Cli) -> Result<RunOptions, String> {
    let classifier = match cli.classifier_json {
        Some(ref json) => serde_json::from_str(json)
            .map_err(|e| format!("Error parsing --classifier-json: {e}"))?,
        None => ClassifierConfig::default(),
    };
    let lut_path = if cli.no_lut {
        None
    } else {
        Some(
            cli.lut
                .clone()
                .unwrap_or_else(|| cli.folder.join(DEFAULT_LUT_PATH)),
        )
    };

    Ok(RunOptions {
        input_dir: cli.folder.clone(),
        output: cli
            .output
            .clone()
            .unwrap_or_else(|| cli.folder.join(DEFAULT_TABLE_NAME)),
        png_dir: cli.png_dir.clone(),
        lut_path,
        config: config_from_cli(cli)?,
        classifier,
    })
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let options = match options_from_cli(&cli) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    log::debug!("config: {:?}", options.config);

    let diagnostics = match inkcal_io::run(&options, &StdClock) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Calibration failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
    }
    eprintln!(
        "Wrote {} ({})",
        options.output.display(),
        diagnostics.summary()
    );

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
