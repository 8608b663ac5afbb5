//! PCM WAV file writing.
//!
//! Containers and restored clips share one layout: 16-bit signed, mono.

use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::Error;
use crate::constants::pcm;

/// Write 16-bit mono samples to a WAV file, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn write_pcm16_mono(path: &Path, samples: &[i16], sample_rate: u32) -> Result<(), Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::OutputDirCreateFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let spec = WavSpec {
        channels: pcm::CHANNELS,
        sample_rate,
        bits_per_sample: pcm::BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| Error::WavWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| Error::WavWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    writer.finalize().map_err(|e| Error::WavWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_written_wav_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep").join("er").join("clip.wav");

        write_pcm16_mono(&path, &[0, 1, -1, i16::MIN, i16::MAX], 22_050).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 1, -1, i16::MIN, i16::MAX]);
    }

    #[test]
    fn test_write_empty_clip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("silence.wav");

        write_pcm16_mono(&path, &[], 8_000).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 0);
    }
}
