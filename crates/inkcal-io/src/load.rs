//! Input folder scanning: classify, decode and extract every image.
//!
//! Files that cannot take part in a run are skipped with a log line and
//! counted; only an unreadable folder or a fatal engine error stops the scan.

use std::path::{Path, PathBuf};

use inkcal_match::{
    CandidateSet, LoadCounters, MatchError, PixelProfile, ProfileSet, Roi, load_profile,
};

use crate::error::LoadError;
use crate::filename::{FilenameClassifier, Role};

/// Probe and candidate profiles loaded from one folder.
#[derive(Debug, Clone, Default)]
pub struct LoadedInputs {
    /// Probe profiles, ascending pressure.
    pub probes: ProfileSet,
    /// Candidate profiles, ascending pressure.
    pub candidates: CandidateSet,
    /// Skip and load counts.
    pub counters: LoadCounters,
}

/// Top-level file names in `dir`, sorted.
fn list_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, LoadError> {
    let read_dir_err = |source| LoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push((name.to_string(), path.clone()));
        } else {
            log::warn!("skipping non-UTF-8 file name {}", path.display());
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Scan `dir` and load every classifiable image's ROI profile.
///
/// Files are visited in name order. Only files with the configured
/// extension are considered; each must carry a pressure tag and a role.
///
/// # Errors
///
/// Returns [`LoadError::ReadDir`] if the folder cannot be listed and
/// [`LoadError::Match`] for an engine error that must stop the run.
pub fn load_folder(
    dir: &Path,
    roi: &Roi,
    classifier: &FilenameClassifier,
) -> Result<LoadedInputs, LoadError> {
    let mut counters = LoadCounters::default();
    let mut probes = Vec::new();
    let mut candidates = Vec::new();

    for (name, path) in list_files(dir)? {
        if !classifier.has_extension(&name) {
            continue;
        }
        counters.files_scanned += 1;

        let Some(pressure) = classifier.pressure(&name) else {
            log::debug!("{name}: no pressure tag, skipped");
            counters.missing_pressure += 1;
            continue;
        };
        let Some(role) = classifier.role(&name) else {
            log::debug!("{name}: neither probe nor candidate, skipped");
            counters.unclassified += 1;
            continue;
        };

        match load_one(&path, &name, roi, pressure) {
            Ok(profile) => match role {
                Role::Probe => probes.push(profile),
                Role::Candidate => candidates.push(profile),
            },
            Err(e) => skip(&name, e, &mut counters)?,
        }
    }

    counters.probes = probes.len();
    counters.candidates = candidates.len();
    log::info!(
        "{}: {} probes, {} candidates from {} files",
        dir.display(),
        counters.probes,
        counters.candidates,
        counters.files_scanned
    );

    Ok(LoadedInputs {
        probes: ProfileSet::new(probes),
        candidates: ProfileSet::new(candidates),
        counters,
    })
}

/// Count a file that failed to load, or fail the scan if the error is fatal.
fn skip(name: &str, err: MatchError, counters: &mut LoadCounters) -> Result<(), LoadError> {
    match err {
        MatchError::RoiOutOfBounds { width, height, .. } => {
            log::warn!("{name}: {width}x{height} image does not contain the ROI, skipped");
            counters.size_mismatches += 1;
        }
        e if e.is_fatal() => return Err(e.into()),
        e => {
            log::warn!("{name}: {e}, skipped");
            counters.decode_failures += 1;
        }
    }
    Ok(())
}

fn load_one(path: &Path, name: &str, roi: &Roi, pressure: f64) -> Result<PixelProfile, MatchError> {
    let bytes = std::fs::read(path)
        .map_err(|e| MatchError::ImageDecode(image::ImageError::IoError(e)))?;
    load_profile(&bytes, roi, name, pressure)
}
