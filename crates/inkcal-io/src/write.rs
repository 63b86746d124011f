//! Writing the calibration table and diagnostic images.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use inkcal_export::{TableAssembler, agreement_heatmap, difference_map, format_number, to_png};
use inkcal_match::{AlphaLut, ExportCounters, ProbeReport, RELAXABLE_THRESHOLD};

use crate::error::LoadError;

/// Common prefix of every visualization file name.
pub const VISUAL_PREFIX: &str = "probe-vs-candidate";

fn create_parent(path: &Path) -> Result<(), LoadError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| LoadError::Write {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Write `table` as CSV to `path`, creating parent folders.
///
/// # Errors
///
/// Returns [`LoadError::Write`] if the file cannot be created and
/// [`LoadError::Table`] if serialization fails.
pub fn write_table(path: &Path, table: &TableAssembler) -> Result<(), LoadError> {
    create_parent(path)?;
    let file = File::create(path).map_err(|source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    table.write_csv(BufWriter::new(file))?;
    log::info!(
        "wrote {} rows x {} columns to {}",
        table.rows().len(),
        table.schema().len(),
        path.display()
    );
    Ok(())
}

/// One diagnostic image to render.
struct Visual<'r> {
    kind: &'static str,
    threshold: u8,
    report: &'r ProbeReport<'r>,
    lut: Option<&'r AlphaLut>,
}

impl Visual<'_> {
    fn file_name(&self) -> String {
        let lut = if self.lut.is_some() { "-lut" } else { "" };
        format!(
            "{VISUAL_PREFIX}-{}{lut}-th{}-P{}.png",
            self.kind,
            self.threshold,
            format_number(self.report.probe.pressure())
        )
    }

    /// Render and write the image into `dir`; `Ok(false)` when the
    /// threshold has no best match to draw.
    fn write(&self, dir: &Path) -> Result<bool, LoadError> {
        let Some(tr) = self.report.threshold(self.threshold) else {
            return Ok(false);
        };
        let Some(best) = tr.best.as_ref() else {
            return Ok(false);
        };
        let probe = self.report.probe;
        let candidate = best.matched.candidate;
        let image = if self.kind == "heatmap" {
            agreement_heatmap(probe, candidate, tr.effective_threshold, self.lut)?
        } else {
            difference_map(probe, candidate, self.lut)?
        };

        let path = dir.join(self.file_name());
        let bytes = to_png(&image).map_err(|source| LoadError::Encode {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, bytes).map_err(|source| LoadError::Write { path, source })?;
        Ok(true)
    }
}

/// Write per-probe diagnostic PNGs into `dir`.
///
/// For every probe: an agreement heatmap of the best match at each
/// threshold and a difference map at the relaxable threshold, plus LUT
/// variants of both at the relaxable threshold when `lut` is given.
/// Failures are logged and counted, never returned.
pub fn write_visuals(
    dir: &Path,
    reports: &[ProbeReport<'_>],
    lut: Option<&AlphaLut>,
) -> ExportCounters {
    let mut counters = ExportCounters::default();
    if let Err(e) = std::fs::create_dir_all(dir) {
        log::warn!("cannot create {}: {e}; no images written", dir.display());
        counters.image_failures += 1;
        return counters;
    }

    for report in reports {
        let mut visuals: Vec<Visual<'_>> = report
            .thresholds
            .iter()
            .map(|t| Visual {
                kind: "heatmap",
                threshold: t.threshold,
                report,
                lut: None,
            })
            .collect();
        visuals.push(Visual {
            kind: "diffmag",
            threshold: RELAXABLE_THRESHOLD,
            report,
            lut: None,
        });
        if let Some(lut) = lut {
            for kind in ["heatmap", "diffmag"] {
                visuals.push(Visual {
                    kind,
                    threshold: RELAXABLE_THRESHOLD,
                    report,
                    lut: Some(lut),
                });
            }
        }

        for visual in &visuals {
            match visual.write(dir) {
                Ok(true) => counters.images_written += 1,
                Ok(false) => {}
                Err(e) => {
                    log::warn!("{}: {e}", visual.file_name());
                    counters.image_failures += 1;
                }
            }
        }
    }

    log::info!(
        "wrote {} images to {} ({} failed)",
        counters.images_written,
        dir.display(),
        counters.image_failures
    );
    counters
}
