//! Full runs over synthetic folders.

#![allow(clippy::unwrap_used)]

use std::fmt::Write as _;
use std::path::Path;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use inkcal_export::TableSchema;
use inkcal_io::{DEFAULT_LUT_PATH, RunOptions, run};
use inkcal_match::{Clock, Roi};

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

const ROI: Roi = Roi {
    x0: 0,
    width: 6,
    y0: 0,
    y1: 40,
};

/// Writes a 12x40 image whose alpha is `alpha` inside `cols x rows`.
fn stroke(dir: &Path, name: &str, cols: u32, rows: u32, alpha: u8) {
    RgbaImage::from_fn(12, 40, |x, y| {
        Rgba([0, 0, 0, if x < cols && y < rows { alpha } else { 0 }])
    })
    .save(dir.join(name))
    .unwrap();
}

fn identity_curve() -> String {
    let mut samples = String::new();
    for i in 0..256 {
        write!(samples, " {}", f64::from(i) / 255.0).unwrap();
    }
    format!("(channel alpha)\n(curve\n    (n-samples 256)\n    (samples 256{samples}))\n")
}

fn fixture(dir: &Path) {
    stroke(dir, "line-N1N2-P0.5-alignedN1.png", 4, 30, 150);
    stroke(dir, "line-N1N2-P0.2-alignedN1.png", 2, 30, 150);
    stroke(dir, "pencil-aligned-dot-index-P0.4-alignedN1.png", 2, 30, 150);
    stroke(dir, "pencil-aligned-dot-index-P0.6-alignedN1.png", 4, 30, 150);
    // Skipped: no pressure tag, and too small for the ROI.
    stroke(dir, "line-N1N2-alignedN1.png", 4, 30, 150);
    RgbaImage::new(4, 4)
        .save(dir.join("pencil-aligned-dot-index-P0.9-alignedN1.png"))
        .unwrap();
}

fn options(dir: &Path) -> RunOptions {
    let mut options = RunOptions::for_folder(dir);
    options.config.roi = ROI;
    options
}

fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let text = std::fs::read_to_string(path).unwrap();
    let mut lines = text.lines().map(|l| l.split(',').map(str::to_owned).collect::<Vec<_>>());
    let header = lines.next().unwrap();
    (header, lines.collect())
}

fn cell<'a>(header: &[String], row: &'a [String], column: &str) -> &'a str {
    let index = header.iter().position(|c| c == column).unwrap();
    &row[index]
}

#[test]
fn folder_run_writes_one_row_per_probe() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let options = options(dir.path());

    let diagnostics = run(&options, &StdClock).unwrap();
    assert_eq!(diagnostics.load.probes, 2);
    assert_eq!(diagnostics.load.candidates, 2);
    assert_eq!(diagnostics.load.missing_pressure, 1);
    assert_eq!(diagnostics.load.size_mismatches, 1);
    assert!(!diagnostics.lut_loaded);
    assert_eq!(diagnostics.export.rows, 2);
    assert_eq!(diagnostics.export.images_written, 0);

    let (header, rows) = read_table(&options.output);
    assert_eq!(header.len(), TableSchema::for_thresholds(&[1, 2, 3]).len());
    assert!(rows.iter().all(|r| r.len() == header.len()));

    // Ascending probe pressure; each probe finds its identical stamp.
    assert_eq!(cell(&header, &rows[0], "probe_pressure"), "0.2");
    assert_eq!(cell(&header, &rows[0], "th1_best_candidate_pressure"), "0.4");
    assert_eq!(cell(&header, &rows[1], "probe_pressure"), "0.5");
    assert_eq!(cell(&header, &rows[1], "th1_best_candidate_pressure"), "0.6");
    assert_eq!(cell(&header, &rows[1], "th1_best_iou"), "1");
    assert_eq!(cell(&header, &rows[1], "th1_effective_threshold"), "1");
}

#[test]
fn lut_and_images_are_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let lut_path = dir.path().join(DEFAULT_LUT_PATH);
    std::fs::create_dir_all(lut_path.parent().unwrap()).unwrap();
    std::fs::write(&lut_path, identity_curve()).unwrap();

    let mut options = options(dir.path());
    let png_dir = dir.path().join("OutPNG");
    options.png_dir = Some(png_dir.clone());

    let diagnostics = run(&options, &StdClock).unwrap();
    assert!(diagnostics.lut_loaded);
    // Per probe: one threshold-1 heatmap, one difference map and their
    // two LUT variants. The 120-pixel unions fail the threshold 2 and 3
    // union floor, so those thresholds have nothing to draw.
    assert_eq!(diagnostics.export.images_written, 8);
    assert_eq!(diagnostics.export.image_failures, 0);
    assert!(
        png_dir
            .join("probe-vs-candidate-heatmap-lut-th1-P0.5.png")
            .is_file()
    );

    let (header, rows) = read_table(&options.output);
    assert_eq!(cell(&header, &rows[1], "th1_best_lut_loaded"), "1");
}

#[test]
fn missing_folder_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(&dir.path().join("absent"));
    assert!(run(&options, &StdClock).is_err());
    assert!(!options.output.exists());
}
