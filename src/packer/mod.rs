//! Duration-bounded packing of clips into containers.
//!
//! Clips are taken strictly in input order. Each container receives clips
//! until the next one would push it past the maximum duration; that clip and
//! everything after it roll over into the next container. Clips are never
//! split and never reordered.

mod container;

pub use container::{Admission, Container, SealedContainer};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::audio::{AudioDecoder, DecodedAudio};
use crate::config::{DecodeFailurePolicy, PackConfig, RateMismatchPolicy};
use crate::error::{Error, Result};
use crate::ledger::{Ledger, write_path_listing};
use crate::progress;

/// Settings for one packing run.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Maximum container duration in seconds.
    pub max_duration: f64,
    /// Container file name prefix.
    pub part_prefix: String,
    /// Ledger identities are made relative to this directory when possible.
    pub base_dir: Option<PathBuf>,
    /// Behaviour on clips that cannot be decoded or recorded.
    pub on_decode_error: DecodeFailurePolicy,
    /// Behaviour on clips whose sample rate differs from their container.
    pub on_rate_mismatch: RateMismatchPolicy,
    /// Sample rate of a container that received no clip.
    pub fallback_sample_rate: u32,
    /// Ledger file name inside the output directory.
    pub ledger_file: String,
    /// Path listing file name inside the output directory.
    pub listing_file: String,
    /// Show a progress bar.
    pub progress: bool,
}

impl PackOptions {
    /// Build options from the `[pack]` configuration table.
    pub fn from_config(config: &PackConfig) -> Self {
        Self {
            max_duration: config.max_duration,
            part_prefix: config.part_prefix.clone(),
            base_dir: None,
            on_decode_error: config.on_decode_error,
            on_rate_mismatch: config.on_rate_mismatch,
            fallback_sample_rate: config.fallback_sample_rate,
            ledger_file: config.ledger_file.clone(),
            listing_file: config.listing_file.clone(),
            progress: false,
        }
    }
}

impl Default for PackOptions {
    fn default() -> Self {
        Self::from_config(&PackConfig::default())
    }
}

/// A clip left out of the ledger because it could not be decoded or recorded.
#[derive(Debug)]
pub struct SkippedClip {
    /// Path of the clip.
    pub path: PathBuf,
    /// Why it was skipped.
    pub error: Error,
}

/// Everything a packing run produced.
#[derive(Debug)]
pub struct PackReport {
    /// Sealed containers in part order.
    pub containers: Vec<SealedContainer>,
    /// Ledger of every packed clip, in packing order.
    pub ledger: Ledger,
    /// Clips skipped under [`DecodeFailurePolicy::Skip`].
    pub skipped: Vec<SkippedClip>,
    /// Where the ledger was written.
    pub ledger_path: PathBuf,
    /// Where the container path listing was written.
    pub listing_path: PathBuf,
}

impl PackReport {
    /// Paths of all sealed container files.
    pub fn container_paths(&self) -> Vec<PathBuf> {
        self.containers.iter().map(|c| c.path.clone()).collect()
    }
}

/// Packs clips into containers using an injected decoder.
pub struct Packer<D> {
    options: PackOptions,
    decoder: D,
}

/// Running totals used to report how far a failed run got.
struct Partial<'a> {
    containers: &'a [SealedContainer],
    ledger: &'a Ledger,
}

impl Partial<'_> {
    fn abort(&self, path: &Path, source: Error) -> Error {
        Error::PackAborted {
            path: path.to_path_buf(),
            containers_written: self.containers.len(),
            entries_written: self.ledger.len(),
            source: Box::new(source),
        }
    }
}

impl<D: AudioDecoder> Packer<D> {
    /// Create a packer.
    pub const fn new(options: PackOptions, decoder: D) -> Self {
        Self { options, decoder }
    }

    /// Pack `clip_paths` in order into containers written to `output_dir`.
    ///
    /// Writes one WAV file per container, then the ledger and the container
    /// path listing. On a fatal error the containers sealed so far stay on
    /// disk and the returned [`Error::PackAborted`] says how many there are.
    pub fn pack(&self, clip_paths: &[PathBuf], output_dir: &Path) -> Result<PackReport> {
        let start = Instant::now();

        fs::create_dir_all(output_dir).map_err(|e| Error::OutputDirCreateFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

        let file_progress =
            progress::create_progress(clip_paths.len(), "clips", self.options.progress);

        let mut containers: Vec<SealedContainer> = Vec::new();
        let mut ledger = Ledger::new();
        let mut skipped = Vec::new();

        let mut remaining = clip_paths.iter();
        // A decoded clip that did not fit the previous container.
        let mut carried: Option<(&PathBuf, String, DecodedAudio)> = None;
        let mut part = 0;

        loop {
            if carried.is_none() && remaining.as_slice().is_empty() {
                break;
            }

            part += 1;
            let mut container = Container::new(part, &self.options.part_prefix);

            loop {
                let (path, identity, clip) = if let Some(pending) = carried.take() {
                    pending
                } else {
                    let Some(path) = remaining.next() else {
                        break;
                    };
                    let loaded = self
                        .identity_for(path)
                        .and_then(|identity| self.decoder.decode(path).map(|clip| (identity, clip)));
                    match loaded {
                        Ok((identity, clip)) => (path, identity, clip),
                        Err(e)
                            if e.is_unusable_clip()
                                && self.options.on_decode_error == DecodeFailurePolicy::Skip =>
                        {
                            warn!("Skipping clip {}: {e}", path.display());
                            skipped.push(SkippedClip {
                                path: path.clone(),
                                error: e,
                            });
                            progress::inc_progress(file_progress.as_ref());
                            continue;
                        }
                        Err(e) => {
                            progress::finish_progress(file_progress, "Failed");
                            let done = Partial {
                                containers: &containers,
                                ledger: &ledger,
                            };
                            return Err(done.abort(path, e));
                        }
                    }
                };

                match container.admit(&clip, self.options.max_duration) {
                    Admission::Accept => {}
                    Admission::Full => {
                        carried = Some((path, identity, clip));
                        break;
                    }
                    Admission::RateMismatch { container_rate } => {
                        if self.options.on_rate_mismatch == RateMismatchPolicy::NewContainer {
                            debug!(
                                "{} is {} Hz, {} is {} Hz; starting a new container",
                                path.display(),
                                clip.sample_rate,
                                container.name(),
                                container_rate
                            );
                            carried = Some((path, identity, clip));
                            break;
                        }
                        progress::finish_progress(file_progress, "Failed");
                        let done = Partial {
                            containers: &containers,
                            ledger: &ledger,
                        };
                        return Err(done.abort(
                            path,
                            Error::SampleRateMismatch {
                                path: path.clone(),
                                clip_rate: clip.sample_rate,
                                container_rate,
                                part,
                            },
                        ));
                    }
                }

                debug!(
                    "{} -> {} at {:.3}s ({:.3}s)",
                    identity,
                    container.name(),
                    container.duration_secs(),
                    clip.duration_secs()
                );
                if let Err(e) = container.append(identity, path, clip) {
                    progress::finish_progress(file_progress, "Failed");
                    let done = Partial {
                        containers: &containers,
                        ledger: &ledger,
                    };
                    return Err(done.abort(path, e));
                }
                progress::inc_progress(file_progress.as_ref());
            }

            // Every remaining clip was skipped; nothing to seal.
            if container.is_empty() {
                break;
            }

            let clips = container.len();
            let sealed = match container.seal(output_dir, self.options.fallback_sample_rate) {
                Ok(sealed) => sealed,
                Err(e) => {
                    progress::finish_progress(file_progress, "Failed");
                    let path = output_dir.join(Container::file_name(&self.options.part_prefix, part));
                    let done = Partial {
                        containers: &containers,
                        ledger: &ledger,
                    };
                    return Err(done.abort(&path, e));
                }
            };

            info!(
                "Sealed {} with {} clip(s), {:.2}s at {} Hz",
                sealed.name,
                clips,
                sealed.duration_secs(),
                sealed.sample_rate
            );
            ledger.extend(sealed.entries.iter().cloned());
            containers.push(sealed);
        }

        progress::finish_progress(file_progress, "Complete");

        let ledger_path = output_dir.join(&self.options.ledger_file);
        ledger.save(&ledger_path)?;

        let listing_path = output_dir.join(&self.options.listing_file);
        let paths: Vec<PathBuf> = containers.iter().map(|c| c.path.clone()).collect();
        write_path_listing(&listing_path, &paths)?;

        info!(
            "Packed {} clip(s) into {} container(s) in {:.2}s",
            ledger.len(),
            containers.len(),
            start.elapsed().as_secs_f64()
        );
        if !skipped.is_empty() {
            warn!("{} clip(s) could not be decoded and were skipped", skipped.len());
        }

        Ok(PackReport {
            containers,
            ledger,
            skipped,
            ledger_path,
            listing_path,
        })
    }

    /// Ledger identity of a clip: relative to `base_dir` when it lies below it.
    ///
    /// The ledger stores identities as JSON strings, so a path that is not
    /// valid UTF-8 cannot be recorded without losing its original name.
    fn identity_for(&self, path: &Path) -> Result<String> {
        let relative = self
            .options
            .base_dir
            .as_deref()
            .and_then(|base| path.strip_prefix(base).ok())
            .unwrap_or(path);
        relative
            .to_str()
            .map(ToString::to_string)
            .ok_or_else(|| Error::NonUtf8Path {
                path: path.to_path_buf(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Decoder serving synthetic clips keyed by path.
    struct FakeDecoder {
        clips: HashMap<PathBuf, DecodedAudio>,
    }

    impl FakeDecoder {
        /// Clips of whole seconds at 100 Hz; sample values encode the clip index.
        fn seconds(durations: &[usize]) -> (Self, Vec<PathBuf>) {
            Self::with_rates(&durations.iter().map(|&d| (d, 100)).collect::<Vec<_>>())
        }

        fn with_rates(specs: &[(usize, u32)]) -> (Self, Vec<PathBuf>) {
            let mut clips = HashMap::new();
            let mut paths = Vec::new();
            for (i, &(seconds, rate)) in specs.iter().enumerate() {
                let path = PathBuf::from(format!("in/clip{}.wav", i + 1));
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let samples = vec![(i + 1) as i16; seconds * rate as usize];
                clips.insert(path.clone(), DecodedAudio::new(samples, rate));
                paths.push(path);
            }
            (Self { clips }, paths)
        }
    }

    impl AudioDecoder for FakeDecoder {
        fn decode(&self, path: &Path) -> Result<DecodedAudio> {
            self.clips
                .get(path)
                .cloned()
                .ok_or_else(|| Error::AudioOpen {
                    path: path.to_path_buf(),
                    source: "no such clip".into(),
                })
        }
    }

    fn options(max_duration: f64) -> PackOptions {
        PackOptions {
            max_duration,
            ..PackOptions::default()
        }
    }

    fn layout(report: &PackReport) -> Vec<(String, String, f64, f64)> {
        report
            .ledger
            .entries()
            .iter()
            .map(|e| (e.file.clone(), e.part.clone(), e.start_time, e.duration))
            .collect()
    }

    #[test]
    fn test_oversized_neighbours_each_get_a_container() {
        let (decoder, paths) = FakeDecoder::seconds(&[10, 15, 10]);
        let out = TempDir::new().unwrap();

        let report = Packer::new(options(20.0), decoder)
            .pack(&paths, out.path())
            .unwrap();

        assert_eq!(
            layout(&report),
            vec![
                ("in/clip1.wav".into(), "output_part_1.wav".into(), 0.0, 10.0),
                ("in/clip2.wav".into(), "output_part_2.wav".into(), 0.0, 15.0),
                ("in/clip3.wav".into(), "output_part_3.wav".into(), 0.0, 10.0),
            ]
        );
        assert_eq!(report.containers.len(), 3);
    }

    #[test]
    fn test_greedy_fill_preserves_order() {
        let (decoder, paths) = FakeDecoder::seconds(&[5, 5, 5, 8, 2, 1]);
        let out = TempDir::new().unwrap();

        let report = Packer::new(options(15.0), decoder)
            .pack(&paths, out.path())
            .unwrap();

        assert_eq!(
            layout(&report),
            vec![
                ("in/clip1.wav".into(), "output_part_1.wav".into(), 0.0, 5.0),
                ("in/clip2.wav".into(), "output_part_1.wav".into(), 5.0, 5.0),
                ("in/clip3.wav".into(), "output_part_1.wav".into(), 10.0, 5.0),
                ("in/clip4.wav".into(), "output_part_2.wav".into(), 0.0, 8.0),
                ("in/clip5.wav".into(), "output_part_2.wav".into(), 8.0, 2.0),
                ("in/clip6.wav".into(), "output_part_2.wav".into(), 10.0, 1.0),
            ]
        );
    }

    #[test]
    fn test_no_skip_ahead_for_smaller_clips() {
        // clip2 does not fit; clip3 would, but order is preserved
        let (decoder, paths) = FakeDecoder::seconds(&[8, 5, 1]);
        let out = TempDir::new().unwrap();

        let report = Packer::new(options(10.0), decoder)
            .pack(&paths, out.path())
            .unwrap();

        let parts: Vec<_> = report.ledger.entries().iter().map(|e| e.part.as_str()).collect();
        assert_eq!(
            parts,
            vec!["output_part_1.wav", "output_part_2.wav", "output_part_2.wav"]
        );
    }

    #[test]
    fn test_exact_fit_closes_container() {
        let (decoder, paths) = FakeDecoder::seconds(&[20, 1]);
        let out = TempDir::new().unwrap();

        let report = Packer::new(options(20.0), decoder)
            .pack(&paths, out.path())
            .unwrap();

        assert_eq!(report.containers.len(), 2);
        assert_eq!(report.containers[0].entries.len(), 1);
        assert_eq!(report.containers[0].duration_secs(), 20.0);
        assert_eq!(report.ledger.entries()[1].part, "output_part_2.wav");
        assert_eq!(report.ledger.entries()[1].start_time, 0.0);
    }

    #[test]
    fn test_lone_overlong_clip_is_accepted() {
        let (decoder, paths) = FakeDecoder::seconds(&[3, 50, 3]);
        let out = TempDir::new().unwrap();

        let report = Packer::new(options(20.0), decoder)
            .pack(&paths, out.path())
            .unwrap();

        assert_eq!(report.containers.len(), 3);
        assert_eq!(report.containers[1].duration_secs(), 50.0);
        assert_eq!(report.containers[1].entries.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let (decoder, _) = FakeDecoder::seconds(&[]);
        let out = TempDir::new().unwrap();

        let report = Packer::new(options(20.0), decoder)
            .pack(&[], out.path())
            .unwrap();

        assert!(report.containers.is_empty());
        assert!(report.ledger.is_empty());
        assert_eq!(
            fs::read_to_string(&report.ledger_path).unwrap().trim(),
            "[]"
        );
        assert!(fs::read_to_string(&report.listing_path).unwrap().is_empty());
    }

    #[test]
    fn test_container_bound_and_disjoint_ranges() {
        let durations = [3, 7, 1, 9, 4, 4, 4, 2, 8, 6, 5, 1, 1, 10, 7];
        let (decoder, paths) = FakeDecoder::seconds(&durations);
        let out = TempDir::new().unwrap();

        let report = Packer::new(options(12.0), decoder)
            .pack(&paths, out.path())
            .unwrap();

        assert_eq!(report.ledger.len(), durations.len());
        for sealed in &report.containers {
            assert!(sealed.duration_secs() <= 12.0);
            let mut cursor = 0.0;
            for entry in &sealed.entries {
                assert_eq!(entry.start_time, cursor);
                cursor += entry.duration;
            }
            assert_eq!(cursor, sealed.duration_secs());
        }
    }

    #[test]
    fn test_container_samples_are_concatenated_in_order() {
        let (decoder, paths) = FakeDecoder::seconds(&[1, 2]);
        let out = TempDir::new().unwrap();

        let report = Packer::new(options(10.0), decoder)
            .pack(&paths, out.path())
            .unwrap();

        let mut reader = hound::WavReader::open(&report.containers[0].path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 300);
        assert!(samples[..100].iter().all(|&s| s == 1));
        assert!(samples[100..].iter().all(|&s| s == 2));
    }

    #[test]
    fn test_decode_failure_aborts_with_progress() {
        let (decoder, mut paths) = FakeDecoder::seconds(&[5, 5, 5]);
        paths.insert(2, PathBuf::from("in/broken.wav"));
        let out = TempDir::new().unwrap();

        let err = Packer::new(options(5.0), decoder)
            .pack(&paths, out.path())
            .unwrap_err();

        match err {
            Error::PackAborted {
                path,
                containers_written,
                entries_written,
                source,
            } => {
                assert_eq!(path, PathBuf::from("in/broken.wav"));
                assert_eq!(containers_written, 1);
                assert_eq!(entries_written, 1);
                assert!(source.is_decode_failure());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(out.path().join("output_part_1.wav").exists());
        assert!(!out.path().join("metadata.json").exists());
    }

    #[test]
    fn test_decode_failure_skip_policy() {
        let (decoder, mut paths) = FakeDecoder::seconds(&[5, 5]);
        paths.insert(1, PathBuf::from("in/broken.wav"));
        let out = TempDir::new().unwrap();

        let mut opts = options(20.0);
        opts.on_decode_error = DecodeFailurePolicy::Skip;
        let report = Packer::new(opts, decoder).pack(&paths, out.path()).unwrap();

        assert_eq!(report.ledger.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, PathBuf::from("in/broken.wav"));
        assert_eq!(report.ledger.entries()[1].start_time, 5.0);
    }

    #[test]
    fn test_rate_mismatch_fails_by_default() {
        let (decoder, paths) = FakeDecoder::with_rates(&[(1, 100), (1, 200)]);
        let out = TempDir::new().unwrap();

        let err = Packer::new(options(20.0), decoder)
            .pack(&paths, out.path())
            .unwrap_err();

        let Error::PackAborted { source, .. } = err else {
            panic!("expected PackAborted");
        };
        assert!(matches!(
            *source,
            Error::SampleRateMismatch {
                clip_rate: 200,
                container_rate: 100,
                part: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_rate_mismatch_new_container_policy() {
        let (decoder, paths) = FakeDecoder::with_rates(&[(1, 100), (1, 200), (1, 200)]);
        let out = TempDir::new().unwrap();

        let mut opts = options(20.0);
        opts.on_rate_mismatch = RateMismatchPolicy::NewContainer;
        let report = Packer::new(opts, decoder).pack(&paths, out.path()).unwrap();

        assert_eq!(report.containers.len(), 2);
        assert_eq!(report.containers[0].sample_rate, 100);
        assert_eq!(report.containers[1].sample_rate, 200);
        assert_eq!(report.containers[1].entries.len(), 2);
    }

    #[cfg(unix)]
    fn non_utf8_clips() -> (FakeDecoder, Vec<PathBuf>) {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (mut decoder, mut paths) = FakeDecoder::seconds(&[1]);
        for name in [&b"in/x\xff.wav"[..], &b"in/x\xfe.wav"[..]] {
            let path = PathBuf::from(OsStr::from_bytes(name));
            decoder
                .clips
                .insert(path.clone(), DecodedAudio::new(vec![9; 100], 100));
            paths.push(path);
        }
        (decoder, paths)
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_aborts_instead_of_collapsing() {
        let (decoder, paths) = non_utf8_clips();
        let out = TempDir::new().unwrap();

        let err = Packer::new(options(20.0), decoder)
            .pack(&paths, out.path())
            .unwrap_err();

        let Error::PackAborted { path, source, .. } = err else {
            panic!("expected PackAborted");
        };
        assert_eq!(path, paths[1]);
        assert!(matches!(*source, Error::NonUtf8Path { .. }));
        assert!(!out.path().join("metadata.json").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_skipped_under_skip_policy() {
        let (decoder, paths) = non_utf8_clips();
        let out = TempDir::new().unwrap();

        let mut opts = options(20.0);
        opts.on_decode_error = DecodeFailurePolicy::Skip;
        let report = Packer::new(opts, decoder).pack(&paths, out.path()).unwrap();

        assert_eq!(report.ledger.len(), 1);
        assert_eq!(report.ledger.entries()[0].file, "in/clip1.wav");
        assert_eq!(report.skipped.len(), 2);
        assert!(
            report
                .skipped
                .iter()
                .all(|s| matches!(s.error, Error::NonUtf8Path { .. }))
        );
    }

    #[test]
    fn test_identity_relative_to_base_dir() {
        let (decoder, paths) = FakeDecoder::seconds(&[1]);
        let out = TempDir::new().unwrap();

        let mut opts = options(20.0);
        opts.base_dir = Some(PathBuf::from("in"));
        let report = Packer::new(opts, decoder).pack(&paths, out.path()).unwrap();

        assert_eq!(report.ledger.entries()[0].file, "clip1.wav");
    }

    #[test]
    fn test_listing_matches_containers() {
        let (decoder, paths) = FakeDecoder::seconds(&[4, 4, 4]);
        let out = TempDir::new().unwrap();

        let report = Packer::new(options(5.0), decoder)
            .pack(&paths, out.path())
            .unwrap();

        let listing = fs::read_to_string(&report.listing_path).unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        for (line, path) in lines.iter().zip(report.container_paths()) {
            assert!(line.ends_with(&*path.file_name().unwrap().to_string_lossy()));
        }
    }
}
