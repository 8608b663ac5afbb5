//! Source file enumeration.
//!
//! Walks an input directory tree and yields the audio files to pack.

use crate::config::ScanOrder;
use crate::constants::files::CONTAINER_EXTENSION;
use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Enumerates audio files below a root directory.
///
/// The walk is lazy and read-only. Every call to [`SourceScanner::iter`]
/// starts a fresh walk, so a scanner can be reused.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    root: PathBuf,
    extensions: Vec<String>,
    /// Canonical output directory and container prefix of an earlier run.
    previous_output: Option<(PathBuf, String)>,
}

impl SourceScanner {
    /// Create a scanner for `root` accepting the given file extensions.
    ///
    /// Extensions are matched case-insensitively; a leading dot is ignored.
    pub fn new<S: AsRef<str>>(root: impl Into<PathBuf>, extensions: &[S]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();

        Self {
            root: root.into(),
            extensions,
            previous_output: None,
        }
    }

    /// Leave out `<prefix>_<n>.wav` containers lying directly in `dir`.
    ///
    /// Containers written inside the scanned tree by an earlier run are then
    /// not packed again. Has no effect while `dir` does not exist.
    #[must_use]
    pub fn skip_containers_in(mut self, dir: &Path, prefix: &str) -> Self {
        if let Ok(dir) = fs::canonicalize(dir) {
            self.previous_output = Some((dir, prefix.to_string()));
        }
        self
    }

    /// Root directory being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a new walk over the tree.
    pub fn iter(&self) -> ScanIter<'_> {
        ScanIter {
            scanner: self,
            pending_dirs: vec![self.root.clone()],
            current: None,
        }
    }

    /// Collect every audio file, in the requested order.
    pub fn collect(&self, order: ScanOrder) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(Error::InputDirNotFound {
                path: self.root.clone(),
            });
        }

        let mut files = self.iter().collect::<Result<Vec<_>>>()?;
        if order == ScanOrder::Sorted {
            files.sort();
        }

        debug!(
            "Found {} audio file(s) under {} ({order} order)",
            files.len(),
            self.root.display()
        );
        Ok(files)
    }

    /// Check whether a path carries one of the accepted extensions.
    pub fn is_audio_file(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| {
            // Compare as OsStr to handle non-UTF-8 filenames
            self.extensions
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(OsStr::new(accepted)))
        })
    }

    fn is_previous_container(&self, path: &Path) -> bool {
        let Some((dir, prefix)) = &self.previous_output else {
            return false;
        };

        let named_like_container = path
            .file_name()
            .and_then(OsStr::to_str)
            .and_then(|name| name.strip_prefix(prefix.as_str()))
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|rest| rest.strip_suffix(CONTAINER_EXTENSION))
            .and_then(|rest| rest.strip_suffix('.'))
            .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()));

        named_like_container
            && path
                .parent()
                .and_then(|parent| fs::canonicalize(parent).ok())
                .is_some_and(|parent| parent == *dir)
    }
}

impl<'a> IntoIterator for &'a SourceScanner {
    type Item = Result<PathBuf>;
    type IntoIter = ScanIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy depth-first walk produced by [`SourceScanner::iter`].
///
/// Symlinked directories are not followed.
#[derive(Debug)]
pub struct ScanIter<'a> {
    scanner: &'a SourceScanner,
    pending_dirs: Vec<PathBuf>,
    current: Option<(PathBuf, ReadDir)>,
}

impl Iterator for ScanIter<'_> {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some((dir, entries)) = self.current.as_mut() else {
                let dir = self.pending_dirs.pop()?;
                match fs::read_dir(&dir) {
                    Ok(entries) => self.current = Some((dir, entries)),
                    Err(source) => return Some(Err(Error::ScanFailed { path: dir, source })),
                }
                continue;
            };

            let entry = match entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(source)) => {
                    return Some(Err(Error::ScanFailed {
                        path: dir.clone(),
                        source,
                    }));
                }
                None => {
                    self.current = None;
                    continue;
                }
            };

            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                self.pending_dirs.push(path);
            } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
                && self.scanner.is_audio_file(&path)
                && !self.scanner.is_previous_container(&path)
            {
                return Some(Ok(path));
            }
        }
    }
}
