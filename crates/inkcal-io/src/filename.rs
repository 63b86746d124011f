//! Filename metadata: pressure tag and probe/candidate role.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Pattern matching the pressure tag, e.g. `-P0.35-`.
pub const PRESSURE_PATTERN: &str = r"-P(?P<p>[0-9]+(?:\.[0-9]+)?)-";

/// Role of an input image in a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Isolated dot stamp.
    Candidate,
    /// Continuous line stroke.
    Probe,
}

/// Case-insensitive filename markers deciding each file's role.
///
/// A name is a candidate when it contains every `candidate_markers`
/// entry. Otherwise it is a probe when it contains every `probe_markers`
/// entry and none of `probe_exclusions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Substrings every candidate name contains.
    pub candidate_markers: Vec<String>,
    /// Substrings every probe name contains.
    pub probe_markers: Vec<String>,
    /// Substrings no probe name contains.
    pub probe_exclusions: Vec<String>,
    /// File extension considered during folder scans (without the dot).
    pub extension: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            candidate_markers: vec!["aligned-dot-index".into(), "-alignedN1".into()],
            probe_markers: vec!["-alignedN1".into(), "N1N2".into()],
            probe_exclusions: vec!["aligned-dot-index".into()],
            extension: "png".into(),
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.contains(&needle.to_lowercase())
}

/// Parses pressure tags and classifies filenames.
#[derive(Debug, Clone)]
pub struct FilenameClassifier {
    pressure: Regex,
    config: ClassifierConfig,
}

impl FilenameClassifier {
    /// Compile the pressure pattern for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Pattern`] if the pattern fails to compile.
    pub fn new(config: ClassifierConfig) -> Result<Self, LoadError> {
        let pressure = RegexBuilder::new(PRESSURE_PATTERN)
            .case_insensitive(true)
            .build()?;
        Ok(Self { pressure, config })
    }

    /// The marker configuration.
    #[must_use]
    pub const fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Pressure encoded in `name`, if any.
    #[must_use]
    pub fn pressure(&self, name: &str) -> Option<f64> {
        self.pressure
            .captures(name)
            .and_then(|c| c.name("p"))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Role of `name`, if it has one.
    #[must_use]
    pub fn role(&self, name: &str) -> Option<Role> {
        let lower = name.to_lowercase();
        let has_all = |markers: &[String]| markers.iter().all(|m| contains_ci(&lower, m));

        if has_all(&self.config.candidate_markers) {
            Some(Role::Candidate)
        } else if has_all(&self.config.probe_markers)
            && !self
                .config
                .probe_exclusions
                .iter()
                .any(|m| contains_ci(&lower, m))
        {
            Some(Role::Probe)
        } else {
            None
        }
    }

    /// Returns `true` if `name` has the configured extension.
    #[must_use]
    pub fn has_extension(&self, name: &str) -> bool {
        std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.config.extension))
    }
}
