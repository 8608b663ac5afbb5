//! Audio decoding and PCM WAV output.

mod decode;
mod wav;

pub use decode::{AudioDecoder, DecodedAudio, SymphoniaDecoder, decode_audio_file};
pub use wav::write_pcm16_mono;
