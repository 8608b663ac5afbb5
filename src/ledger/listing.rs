//! Flat listing of container paths, one absolute path per line.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write the absolute paths of `containers` to `path`, one per line.
///
/// Relative container paths are resolved against the current directory.
pub fn write_path_listing(path: &Path, containers: &[PathBuf]) -> Result<()> {
    let to_error = |source| Error::ListingWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(to_error)?);
    for container in containers {
        let absolute = std::path::absolute(container).map_err(to_error)?;
        writeln!(writer, "{}", absolute.display()).map_err(to_error)?;
    }
    writer.flush().map_err(to_error)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_listing_one_absolute_path_per_line() {
        let dir = TempDir::new().unwrap();
        let listing = dir.path().join("file_paths.txt");
        let containers = vec![
            dir.path().join("output_part_1.wav"),
            dir.path().join("output_part_2.wav"),
        ];

        write_path_listing(&listing, &containers).unwrap();

        let contents = std::fs::read_to_string(&listing).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| Path::new(l).is_absolute()));
        assert!(lines[0].ends_with("output_part_1.wav"));
        assert!(lines[1].ends_with("output_part_2.wav"));
    }

    #[test]
    fn test_listing_empty() {
        let dir = TempDir::new().unwrap();
        let listing = dir.path().join("file_paths.txt");

        write_path_listing(&listing, &[]).unwrap();

        assert!(std::fs::read_to_string(&listing).unwrap().is_empty());
    }

    #[test]
    fn test_listing_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let listing = dir.path().join("file_paths.txt");

        write_path_listing(&listing, &[PathBuf::from("out/output_part_1.wav")]).unwrap();

        let contents = std::fs::read_to_string(&listing).unwrap();
        assert!(Path::new(contents.trim_end()).is_absolute());
    }
}
