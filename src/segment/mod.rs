//! Re-segmentation: restore every ledger entry as a standalone file.
//!
//! Entries are processed in ledger order. Per-entry failures are collected
//! and reported at the end; they never stop the batch.

mod cache;

pub use cache::ContainerCache;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::audio::{AudioDecoder, write_pcm16_mono};
use crate::config::SegmentConfig;
use crate::constants::DEFAULT_JOBS;
use crate::error::{Error, Result};
use crate::ledger::{Ledger, LedgerEntry};
use crate::progress;

/// Settings for one re-segmentation run.
#[derive(Debug, Clone)]
pub struct ResegmentOptions {
    /// Number of worker threads; 1 processes entries on the calling thread.
    pub jobs: usize,
    /// Show a progress bar.
    pub progress: bool,
}

impl ResegmentOptions {
    /// Build options from the `[segment]` configuration table.
    pub const fn from_config(config: &SegmentConfig) -> Self {
        Self {
            jobs: config.jobs,
            progress: false,
        }
    }
}

impl Default for ResegmentOptions {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            progress: false,
        }
    }
}

/// A ledger entry that could not be restored.
#[derive(Debug)]
pub struct EntryFailure {
    /// Position of the entry in the ledger.
    pub index: usize,
    /// Recorded file identity.
    pub file: String,
    /// What went wrong.
    pub error: Error,
}

/// Outcome of a re-segmentation run.
#[derive(Debug, Default)]
pub struct ResegmentReport {
    /// Files written, in ledger order.
    pub written: Vec<PathBuf>,
    /// Entries that failed, in ledger order.
    pub failures: Vec<EntryFailure>,
    /// Entries in the ledger.
    pub total: usize,
}

impl ResegmentReport {
    /// Whether every entry was restored.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert a report with failures into [`Error::ResegmentIncomplete`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(Error::ResegmentIncomplete {
                failed: self.failures.len(),
                total: self.total,
            })
        }
    }
}

/// An entry cleared for writing, with its resolved output path.
struct Job<'a> {
    index: usize,
    entry: &'a LedgerEntry,
    output: PathBuf,
}

/// Restores ledger entries from containers through a shared cache.
pub struct Resegmenter<'c, D> {
    options: ResegmentOptions,
    cache: &'c ContainerCache<D>,
}

impl<'c, D: AudioDecoder> Resegmenter<'c, D> {
    /// Create a re-segmenter reading containers through `cache`.
    pub const fn new(options: ResegmentOptions, cache: &'c ContainerCache<D>) -> Self {
        Self { options, cache }
    }

    /// Write one file per ledger entry below `output_base`.
    ///
    /// Output paths mirror each entry's `file` identity. A second entry that
    /// maps to an already claimed output path is reported as
    /// [`Error::PathCollision`] and not written.
    pub fn resegment(
        &self,
        ledger: &Ledger,
        container_dir: &Path,
        output_base: &Path,
    ) -> Result<ResegmentReport> {
        let start = Instant::now();
        let (jobs, mut failures) = plan(ledger, output_base);

        let pb = progress::create_progress(ledger.len(), "entries", self.options.progress);
        // Collisions are already settled; count them as done.
        for _ in &failures {
            progress::inc_progress(pb.as_ref());
        }

        let workers = self.options.jobs.clamp(1, jobs.len().max(1));
        let results: Vec<(usize, Result<PathBuf>)> = if workers == 1 {
            jobs.iter()
                .map(|job| {
                    let result = self.restore(job, container_dir);
                    progress::inc_progress(pb.as_ref());
                    (job.index, result)
                })
                .collect()
        } else {
            debug!("Restoring {} entries on {workers} threads", jobs.len());
            self.restore_parallel(&jobs, container_dir, workers, pb.as_ref())?
        };

        let mut written = Vec::with_capacity(jobs.len());
        for (index, result) in results {
            match result {
                Ok(path) => written.push((index, path)),
                Err(error) => {
                    let file = ledger.entries()[index].file.clone();
                    warn!("Entry {index} ({file}) failed: {error}");
                    failures.push(EntryFailure { index, file, error });
                }
            }
        }
        written.sort_by_key(|(index, _)| *index);
        failures.sort_by_key(|f| f.index);

        progress::finish_progress(pb, "Complete");

        info!(
            "Restored {} of {} entries from {} container(s) in {:.2}s",
            written.len(),
            ledger.len(),
            self.cache.decode_count(),
            start.elapsed().as_secs_f64()
        );
        if !failures.is_empty() {
            warn!("{} entries could not be restored", failures.len());
        }

        Ok(ResegmentReport {
            written: written.into_iter().map(|(_, path)| path).collect(),
            failures,
            total: ledger.len(),
        })
    }

    /// Drain `jobs` from a shared cursor on scoped worker threads.
    fn restore_parallel(
        &self,
        jobs: &[Job<'_>],
        container_dir: &Path,
        workers: usize,
        pb: Option<&ProgressBar>,
    ) -> Result<Vec<(usize, Result<PathBuf>)>> {
        let next = AtomicUsize::new(0);
        let results = Mutex::new(Vec::with_capacity(jobs.len()));

        thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(|| {
                    while let Some(job) = jobs.get(next.fetch_add(1, Ordering::Relaxed)) {
                        let result = self.restore(job, container_dir);
                        progress::inc_progress(pb);
                        if let Ok(mut results) = results.lock() {
                            results.push((job.index, result));
                        }
                    }
                });
            }
        });

        results.into_inner().map_err(|_| Error::Internal {
            message: "re-segmentation worker panicked".to_string(),
        })
    }

    /// Slice one entry out of its container and write it.
    fn restore(&self, job: &Job<'_>, container_dir: &Path) -> Result<PathBuf> {
        let entry = job.entry;
        let audio = self.cache.get_or_load(container_dir, &entry.part)?;

        let (start, end) = entry.sample_range(audio.sample_rate);
        let available = audio.len();
        if start > available || (start == available && end > start) {
            return Err(Error::RangeOutOfBounds {
                file: entry.file.clone(),
                part: entry.part.clone(),
                start,
                end,
                available,
            });
        }
        if end > available {
            debug!(
                "Clamping {} to {available} samples of {} (recorded end {end})",
                entry.file, entry.part
            );
        }
        let end = end.min(available);

        write_pcm16_mono(&job.output, &audio.samples[start..end], audio.sample_rate)?;
        debug!(
            "Wrote {} ({} samples from {})",
            job.output.display(),
            end - start,
            entry.part
        );
        Ok(job.output.clone())
    }
}

/// Resolve output paths in ledger order; later entries that collide fail.
fn plan<'a>(ledger: &'a Ledger, output_base: &Path) -> (Vec<Job<'a>>, Vec<EntryFailure>) {
    let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
    let mut jobs = Vec::with_capacity(ledger.len());
    let mut failures = Vec::new();

    for (index, entry) in ledger.entries().iter().enumerate() {
        let output = output_base.join(entry.relative_output_path());
        match claimed.entry(output.clone()) {
            Entry::Occupied(first) => {
                let error = Error::PathCollision {
                    path: output,
                    first_entry: *first.get(),
                };
                warn!("Entry {index} ({}) skipped: {error}", entry.file);
                failures.push(EntryFailure {
                    index,
                    file: entry.file.clone(),
                    error,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(index);
                jobs.push(Job {
                    index,
                    entry,
                    output,
                });
            }
        }
    }

    (jobs, failures)
}
