//! Error types for audiopack.

use std::path::PathBuf;

/// Result type alias for audiopack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for audiopack.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Input directory does not exist or is not a directory.
    #[error("input directory not found: {path}")]
    InputDirNotFound {
        /// Path that was expected to be a directory.
        path: PathBuf,
    },

    /// Failed to read a directory while scanning for audio files.
    #[error("failed to scan directory '{path}'")]
    ScanFailed {
        /// Directory being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to open audio file.
    #[error("failed to open audio file '{path}'")]
    AudioOpen {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to decode audio.
    #[error("failed to decode audio from '{path}'")]
    AudioDecode {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No audio tracks found.
    #[error("no audio tracks found in '{path}'")]
    NoAudioTracks {
        /// Path to the audio file.
        path: PathBuf,
    },

    /// A clip's sample rate differs from the rate of the container it would join.
    #[error(
        "sample rate mismatch for '{path}': clip is {clip_rate} Hz, container part {part} is {container_rate} Hz"
    )]
    SampleRateMismatch {
        /// Clip that could not be appended.
        path: PathBuf,
        /// Sample rate of the clip.
        clip_rate: u32,
        /// Sample rate established by the container's first clip.
        container_rate: u32,
        /// Part index of the open container.
        part: usize,
    },

    /// Packing stopped on a fatal error; earlier containers stay on disk.
    #[error(
        "packing aborted at '{path}' after writing {containers_written} container(s) with {entries_written} entries"
    )]
    PackAborted {
        /// Clip being processed when the run failed.
        path: PathBuf,
        /// Containers sealed and written before the failure.
        containers_written: usize,
        /// Ledger entries belonging to the written containers.
        entries_written: usize,
        /// The error that stopped the run.
        #[source]
        source: Box<Self>,
    },

    /// Clip path cannot be recorded in the ledger without losing its name.
    #[error("clip path is not valid UTF-8: '{}'", path.display())]
    NonUtf8Path {
        /// Offending clip path.
        path: PathBuf,
    },

    /// Container referenced by the ledger does not exist.
    #[error("container '{part}' not found at '{path}'")]
    MissingContainer {
        /// Container file name from the ledger.
        part: String,
        /// Resolved path that was checked.
        path: PathBuf,
    },

    /// Container exists but could not be decoded.
    #[error("failed to decode container '{part}': {reason}")]
    ContainerDecode {
        /// Container file name from the ledger.
        part: String,
        /// Description of the decode failure.
        reason: String,
    },

    /// Two ledger entries resolve to the same output file.
    #[error("output path '{path}' already written by entry {first_entry}")]
    PathCollision {
        /// Output path both entries map to.
        path: PathBuf,
        /// Index of the entry that wrote the file first.
        first_entry: usize,
    },

    /// Ledger entry describes a range outside its container.
    #[error("entry '{file}' spans {start}..{end} but '{part}' has {available} samples")]
    RangeOutOfBounds {
        /// Recorded file identity.
        file: String,
        /// Container file name.
        part: String,
        /// First sample of the range.
        start: usize,
        /// One past the last sample of the range.
        end: usize,
        /// Samples available in the container.
        available: usize,
    },

    /// Re-segmentation finished with per-entry failures.
    #[error("{failed} of {total} ledger entries could not be restored")]
    ResegmentIncomplete {
        /// Number of failed entries.
        failed: usize,
        /// Number of entries in the ledger.
        total: usize,
    },

    /// Failed to read ledger file.
    #[error("failed to read ledger file '{path}'")]
    LedgerRead {
        /// Path to the ledger file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse ledger file.
    #[error("failed to parse ledger file '{path}'")]
    LedgerParse {
        /// Path to the ledger file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to create ledger file.
    #[error("failed to create ledger file '{path}'")]
    LedgerCreate {
        /// Path to the ledger file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write ledger file.
    #[error("failed to write ledger file '{path}'")]
    LedgerWrite {
        /// Path to the ledger file.
        path: PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write the container path listing.
    #[error("failed to write path listing '{path}'")]
    ListingWrite {
        /// Path to the listing file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write WAV file.
    #[error("failed to write WAV file '{path}'")]
    WavWriteFailed {
        /// Path to the WAV file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: hound::Error,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Whether this error means the source clip itself could not be decoded.
    pub const fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::AudioOpen { .. } | Self::AudioDecode { .. } | Self::NoAudioTracks { .. }
        )
    }

    /// Whether this error rules out one clip without affecting the rest of a run.
    pub const fn is_unusable_clip(&self) -> bool {
        self.is_decode_failure() || matches!(self, Self::NonUtf8Path { .. })
    }
}
