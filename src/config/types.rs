//! Configuration type definitions.

use crate::constants::{
    DEFAULT_EXTENSIONS, DEFAULT_FALLBACK_SAMPLE_RATE, DEFAULT_JOBS, DEFAULT_MAX_DURATION_SECS,
    files,
};
use serde::{Deserialize, Serialize};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Packing settings.
    #[serde(default)]
    pub pack: PackConfig,

    /// Re-segmentation settings.
    #[serde(default)]
    pub segment: SegmentConfig,
}

/// Packing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Maximum duration of one container in seconds.
    pub max_duration: f64,

    /// Container file name prefix; files are named `<prefix>_<N>.wav`.
    pub part_prefix: String,

    /// File extensions treated as audio when scanning.
    pub extensions: Vec<String>,

    /// Order in which scanned files are packed.
    pub order: ScanOrder,

    /// What to do when a clip cannot be decoded.
    pub on_decode_error: DecodeFailurePolicy,

    /// What to do when a clip's sample rate differs from its container's.
    pub on_rate_mismatch: RateMismatchPolicy,

    /// Sample rate for a container that never received a clip.
    pub fallback_sample_rate: u32,

    /// Ledger file name written into the output directory.
    ///
    /// `segment` looks for the same name in the container directory.
    pub ledger_file: String,

    /// Path listing file name written into the output directory.
    pub listing_file: String,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            max_duration: DEFAULT_MAX_DURATION_SECS,
            part_prefix: files::DEFAULT_PART_PREFIX.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            order: ScanOrder::default(),
            on_decode_error: DecodeFailurePolicy::default(),
            on_rate_mismatch: RateMismatchPolicy::default(),
            fallback_sample_rate: DEFAULT_FALLBACK_SAMPLE_RATE,
            ledger_file: files::DEFAULT_LEDGER_FILE.to_string(),
            listing_file: files::DEFAULT_LISTING_FILE.to_string(),
        }
    }
}

/// Re-segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Number of worker threads writing restored clips.
    pub jobs: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
        }
    }
}

/// Ordering of scanned files before packing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    /// Lexicographic path order, reproducible across platforms.
    #[default]
    Sorted,
    /// Whatever order the directory walk yields.
    Traversal,
}

/// Behaviour when a source clip fails to decode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecodeFailurePolicy {
    /// Stop the whole run.
    #[default]
    Abort,
    /// Log the clip, leave it out of the ledger and continue.
    Skip,
}

/// Behaviour when a clip's sample rate differs from the open container.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RateMismatchPolicy {
    /// Stop the whole run.
    #[default]
    Fail,
    /// Seal the open container and start a new one at the clip's rate.
    NewContainer,
}

impl std::fmt::Display for ScanOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sorted => write!(f, "sorted"),
            Self::Traversal => write!(f, "traversal"),
        }
    }
}

impl std::str::FromStr for ScanOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sorted" | "sort" => Ok(Self::Sorted),
            "traversal" | "walk" => Ok(Self::Traversal),
            other => Err(format!("unknown scan order: {other}")),
        }
    }
}
