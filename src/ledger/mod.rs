//! Packing ledger: which clip lives in which container, and where.
//!
//! The ledger is the only contract between packing and re-segmentation. It is
//! written once as a JSON array after all containers are sealed.

mod listing;

pub use listing::write_path_listing;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

/// One record per packed clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Identity of the original clip, relative to the scanned root when possible.
    pub file: String,
    /// Clip duration in seconds.
    pub duration: f64,
    /// Offset of the clip inside its container in seconds.
    pub start_time: f64,
    /// File name of the owning container.
    pub part: String,
}

impl LedgerEntry {
    /// Sample range `[start, end)` of this clip inside a container at `sample_rate`.
    ///
    /// Offsets are stored in seconds but were produced from integer sample
    /// counts, so rounding recovers the exact bounds.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn sample_range(&self, sample_rate: u32) -> (usize, usize) {
        let rate = f64::from(sample_rate);
        let start = (self.start_time.max(0.0) * rate).round() as usize;
        let len = (self.duration.max(0.0) * rate).round() as usize;
        (start, start.saturating_add(len))
    }

    /// Relative output path for the restored clip.
    ///
    /// Root, prefix and `..` components are dropped so the result always stays
    /// below whatever base directory it is joined onto.
    pub fn relative_output_path(&self) -> PathBuf {
        Path::new(&self.file)
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                Component::Prefix(_)
                | Component::RootDir
                | Component::CurDir
                | Component::ParentDir => None,
            })
            .collect()
    }
}

/// The ordered set of ledger entries across all containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append all entries of a sealed container.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = LedgerEntry>) {
        self.entries.extend(entries);
    }

    /// Entries in packing order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a ledger from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::LedgerRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::LedgerParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write the ledger as a pretty-printed JSON array.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::LedgerCreate {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| Error::LedgerWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl FromIterator<LedgerEntry> for Ledger {
    fn from_iter<I: IntoIterator<Item = LedgerEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a LedgerEntry;
    type IntoIter = std::slice::Iter<'a, LedgerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
