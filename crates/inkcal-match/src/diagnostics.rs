//! Run diagnostics: stage timings and skip/outcome counters.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::calibrate::ProbeReport;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of elapsed time for stage measurements, supplied by the caller.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// Current point in time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Run `f` and measure how long it took on `clock`.
pub fn timed<C: Clock, T>(clock: &C, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let value = f();
    (value, clock.elapsed(&start))
}

/// Counters from scanning and decoding the input folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadCounters {
    /// Regular files seen.
    pub files_scanned: usize,
    /// Files without a pressure tag in their name.
    pub missing_pressure: usize,
    /// Files with a pressure tag but neither role.
    pub unclassified: usize,
    /// Files the decoder rejected, including unsupported pixel layouts.
    pub decode_failures: usize,
    /// Images too small for the ROI.
    pub size_mismatches: usize,
    /// Candidate profiles loaded.
    pub candidates: usize,
    /// Probe profiles loaded.
    pub probes: usize,
}

/// Outcome counters from the matching stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounters {
    /// Probes calibrated.
    pub probes: usize,
    /// (probe, threshold) pairs evaluated.
    pub evaluations: usize,
    /// (probe, threshold) pairs where no candidate passed the gates.
    pub gate_rejections: usize,
    /// Probes whose relaxable threshold was relaxed.
    pub relaxed_probes: usize,
    /// Probes for which an over/under search ran and found nothing.
    pub over_under_misses: usize,
}

impl MatchCounters {
    /// Tally counters from calibration reports.
    #[must_use]
    pub fn from_reports(reports: &[ProbeReport<'_>]) -> Self {
        let mut counters = Self {
            probes: reports.len(),
            ..Self::default()
        };
        for report in reports {
            counters.evaluations += report.thresholds.len();
            counters.gate_rejections += report.thresholds.iter().filter(|t| t.is_rejected()).count();
            if report.thresholds.iter().any(|t| t.is_relaxed()) {
                counters.relaxed_probes += 1;
            }
            if report.over_under.as_ref().is_some_and(|s| s.best.is_none()) {
                counters.over_under_misses += 1;
            }
        }
        counters
    }
}

/// Counters from writing outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportCounters {
    /// Data rows written.
    pub rows: usize,
    /// Header width.
    pub columns: usize,
    /// Visualization images written.
    pub images_written: usize,
    /// Visualization images that failed to write.
    pub image_failures: usize,
}

/// Diagnostics collected from a single calibration run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunDiagnostics {
    /// Folder scan and decode time.
    #[serde(with = "duration_serde")]
    pub load_duration: Duration,
    /// Matching time.
    #[serde(with = "duration_serde")]
    pub match_duration: Duration,
    /// Table and image output time.
    #[serde(with = "duration_serde")]
    pub export_duration: Duration,
    /// Whether a LUT was loaded.
    pub lut_loaded: bool,
    /// Load-stage counters.
    pub load: LoadCounters,
    /// Match-stage counters.
    pub matching: MatchCounters,
    /// Export-stage counters.
    pub export: ExportCounters,
}

impl RunDiagnostics {
    /// Sum of the stage durations.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.load_duration + self.match_duration + self.export_duration
    }

    /// One-line completion summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} rows; decode failures: {}, size mismatches: {}, gate rejections: {}, relaxed probes: {}",
            self.export.rows,
            self.load.decode_failures,
            self.load.size_mismatches,
            self.matching.gate_rejections,
            self.matching.relaxed_probes,
        )
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Calibration Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration())
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<12} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration());
        let load = &self.load;
        let matching = &self.matching;
        let export = &self.export;
        let stages = [
            (
                "Load",
                self.load_duration,
                format!(
                    "{} files -> {} probes, {} candidates (no pressure={} unclassified={} decode={} size={})",
                    load.files_scanned,
                    load.probes,
                    load.candidates,
                    load.missing_pressure,
                    load.unclassified,
                    load.decode_failures,
                    load.size_mismatches,
                ),
            ),
            (
                "Match",
                self.match_duration,
                format!(
                    "{} evaluations, {} gate rejections, {} relaxed, {} over/under misses{}",
                    matching.evaluations,
                    matching.gate_rejections,
                    matching.relaxed_probes,
                    matching.over_under_misses,
                    if self.lut_loaded { ", LUT" } else { "" },
                ),
            ),
            (
                "Export",
                self.export_duration,
                format!(
                    "{} rows x {} columns, {} images ({} failed)",
                    export.rows, export.columns, export.images_written, export.image_failures,
                ),
            ),
        ];

        for (name, duration, details) in &stages {
            let ms = duration_ms(*duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!("{name:<12} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(self.summary());

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
