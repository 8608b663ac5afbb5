//! In-memory container arena.

use std::path::{Path, PathBuf};

use crate::audio::{DecodedAudio, write_pcm16_mono};
use crate::constants::files::CONTAINER_EXTENSION;
use crate::error::{Error, Result};
use crate::ledger::LedgerEntry;

/// Outcome of offering a clip to an open container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The clip fits and may be appended.
    Accept,
    /// The clip would push the container past its maximum duration.
    Full,
    /// The clip's sample rate differs from the container's.
    RateMismatch {
        /// Rate established by the container's first clip.
        container_rate: u32,
    },
}

/// A container being filled with clips.
///
/// Samples accumulate in a growable arena that is released when the
/// container is sealed.
#[derive(Debug)]
pub struct Container {
    index: usize,
    name: String,
    sample_rate: Option<u32>,
    samples: Vec<i16>,
    entries: Vec<LedgerEntry>,
}

impl Container {
    /// Open an empty container with a 1-based part index.
    pub fn new(index: usize, prefix: &str) -> Self {
        Self {
            index,
            name: Self::file_name(prefix, index),
            sample_rate: None,
            samples: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// File name of the container with the given part index.
    pub fn file_name(prefix: &str, index: usize) -> String {
        format!("{prefix}_{index}.{CONTAINER_EXTENSION}")
    }

    /// Container file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether no clip has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of clips appended so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total duration of appended clips in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        self.sample_rate.map_or(0.0, |rate| {
            self.samples.len() as f64 / f64::from(rate)
        })
    }

    /// Decide whether `clip` may be appended under `max_duration` seconds.
    ///
    /// The first clip is always accepted, even when it alone is longer than
    /// `max_duration`.
    pub fn admit(&self, clip: &DecodedAudio, max_duration: f64) -> Admission {
        let Some(rate) = self.sample_rate else {
            return Admission::Accept;
        };

        if clip.sample_rate != rate {
            return Admission::RateMismatch {
                container_rate: rate,
            };
        }

        // Sum sample counts first so the comparison sees a single rounding.
        #[allow(clippy::cast_precision_loss)]
        let combined = (self.samples.len() + clip.samples.len()) as f64 / f64::from(rate);
        if combined > max_duration {
            Admission::Full
        } else {
            Admission::Accept
        }
    }

    /// Append a clip and record its ledger entry.
    ///
    /// `file` is the identity written into the ledger; `source` is only used
    /// for error reporting.
    #[allow(clippy::cast_precision_loss)]
    pub fn append(&mut self, file: String, source: &Path, clip: DecodedAudio) -> Result<()> {
        let rate = *self.sample_rate.get_or_insert(clip.sample_rate);
        if clip.sample_rate != rate {
            return Err(Error::SampleRateMismatch {
                path: source.to_path_buf(),
                clip_rate: clip.sample_rate,
                container_rate: rate,
                part: self.index,
            });
        }

        let rate = f64::from(rate);
        self.entries.push(LedgerEntry {
            file,
            duration: clip.samples.len() as f64 / rate,
            start_time: self.samples.len() as f64 / rate,
            part: self.name.clone(),
        });
        self.samples.extend_from_slice(&clip.samples);
        Ok(())
    }

    /// Write the container to `dir` and release its sample buffer.
    ///
    /// `fallback_rate` is used only if no clip was ever appended.
    pub fn seal(self, dir: &Path, fallback_rate: u32) -> Result<SealedContainer> {
        let path = dir.join(&self.name);
        let sample_rate = self.sample_rate.unwrap_or(fallback_rate);
        write_pcm16_mono(&path, &self.samples, sample_rate)?;

        Ok(SealedContainer {
            index: self.index,
            name: self.name,
            path,
            sample_rate,
            samples: self.samples.len(),
            entries: self.entries,
        })
    }
}

/// A container persisted to disk.
#[derive(Debug, Clone)]
pub struct SealedContainer {
    /// Part index.
    pub index: usize,
    /// Container file name.
    pub name: String,
    /// Where the container was written.
    pub path: PathBuf,
    /// Sample rate of the written file.
    pub sample_rate: u32,
    /// Number of samples written.
    pub samples: usize,
    /// Ledger entries of the clips it holds, in offset order.
    pub entries: Vec<LedgerEntry>,
}

impl SealedContainer {
    /// Duration of the written file in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        self.samples as f64 / f64::from(self.sample_rate)
    }
}
