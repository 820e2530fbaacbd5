//! WAV container for uploads.

use std::io::Cursor;

use crate::audio::CapturedAudio;
use crate::error::{MoodError, Result};

/// Encodes a mono recording as 16-bit PCM WAV bytes.
pub fn encode_wav(audio: &CapturedAudio) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)
        .map_err(|e| MoodError::Audio(format!("failed to create wav writer: {e}")))?;

    for &s in &audio.samples {
        let clamped = s.clamp(-1.0, 1.0);
        let v = (clamped * i16::MAX as f32).round() as i16;
        writer
            .write_sample(v)
            .map_err(|e| MoodError::Audio(format!("failed to write wav sample: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| MoodError::Audio(format!("failed to finalize wav: {e}")))?;
    Ok(cursor.into_inner())
}
