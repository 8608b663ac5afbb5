//! Decode-on-first-use container cache.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::debug;

use crate::audio::{AudioDecoder, DecodedAudio};
use crate::error::{Error, Result};

/// Why a container could not be loaded. Kept so every requester sees the same outcome.
#[derive(Debug, Clone)]
enum LoadFailure {
    Missing(PathBuf),
    Decode(String),
}

type Slot = Arc<OnceLock<std::result::Result<Arc<DecodedAudio>, LoadFailure>>>;

/// Single-flight cache of decoded containers, scoped to one run.
///
/// Each container is decoded at most once. Concurrent requests for a
/// container that is still decoding block until the first decode finishes,
/// then share its result. Failures are cached as well.
pub struct ContainerCache<D> {
    decoder: D,
    slots: DashMap<PathBuf, Slot>,
    decodes: AtomicUsize,
}

impl<D: AudioDecoder> ContainerCache<D> {
    /// Create an empty cache backed by `decoder`.
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            slots: DashMap::new(),
            decodes: AtomicUsize::new(0),
        }
    }

    /// Decoded samples of container `part` inside `dir`.
    ///
    /// Only the final path component of `part` is used, so a ledger cannot
    /// point the cache outside `dir`.
    pub fn get_or_load(&self, dir: &Path, part: &str) -> Result<Arc<DecodedAudio>> {
        let path = Path::new(part)
            .file_name()
            .map_or_else(|| dir.join(part), |name| dir.join(name));

        let slot = Arc::clone(self.slots.entry(path.clone()).or_default().value());

        let loaded = slot.get_or_init(|| self.load(&path));
        match loaded {
            Ok(audio) => Ok(Arc::clone(audio)),
            Err(LoadFailure::Missing(path)) => Err(Error::MissingContainer {
                part: part.to_string(),
                path: path.clone(),
            }),
            Err(LoadFailure::Decode(reason)) => Err(Error::ContainerDecode {
                part: part.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    /// Number of decodes actually performed.
    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::Relaxed)
    }

    /// Number of distinct containers requested so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no container has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn load(&self, path: &Path) -> std::result::Result<Arc<DecodedAudio>, LoadFailure> {
        if !path.is_file() {
            return Err(LoadFailure::Missing(path.to_path_buf()));
        }

        self.decodes.fetch_add(1, Ordering::Relaxed);
        debug!("Decoding container {}", path.display());
        match self.decoder.decode(path) {
            Ok(audio) => {
                debug!(
                    "Decoded {}: {} samples at {} Hz",
                    path.display(),
                    audio.len(),
                    audio.sample_rate
                );
                Ok(Arc::new(audio))
            }
            Err(e) => Err(LoadFailure::Decode(error_chain(&e))),
        }
    }
}

/// Render an error and its sources on one line.
fn error_chain(error: &Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
