//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "audiopack";

/// Default maximum container duration in seconds (29 min 40 s).
///
/// Sits just under the 30 minute per-file limit common to upload services.
pub const DEFAULT_MAX_DURATION_SECS: f64 = 29.0 * 60.0 + 40.0;

/// Sample rate used when sealing a container that received no clip.
pub const DEFAULT_FALLBACK_SAMPLE_RATE: u32 = 44_100;

/// Default number of re-segmentation workers.
pub const DEFAULT_JOBS: usize = 1;

/// Upper bound for `--jobs`.
pub const MAX_JOBS: usize = 256;

/// Container and ledger file naming.
pub mod files {
    /// Default prefix for container files (`output_part_<N>.wav`).
    pub const DEFAULT_PART_PREFIX: &str = "output_part";

    /// Container file extension.
    pub const CONTAINER_EXTENSION: &str = "wav";

    /// Default ledger file name.
    pub const DEFAULT_LEDGER_FILE: &str = "metadata.json";

    /// Default container path listing file name.
    pub const DEFAULT_LISTING_FILE: &str = "file_paths.txt";
}

/// PCM layout shared by containers and restored clips.
pub mod pcm {
    /// Containers and restored clips are mono.
    pub const CHANNELS: u16 = 1;

    /// Bits per sample of containers and restored clips.
    pub const BITS_PER_SAMPLE: u16 = 16;
}

/// Default audio file extensions picked up by the scanner.
pub const DEFAULT_EXTENSIONS: &[&str] = &["wav"];

/// Extensions the decoder understands.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "m4a", "aac"];
