//! Decoding of base64 synthesised replies (MP3, or WAV from some backends).

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::DecodedClip;
use crate::error::{MoodError, Result};

/// Decodes a base64 audio payload into mono f32 samples.
///
/// The decoded byte buffer lives only for the duration of the call.
///
/// # Errors
///
/// Returns [`MoodError::DecodeFailed`] for invalid base64, unrecognised
/// containers or payloads with no audio frames.
pub fn decode_reply(payload: &str) -> Result<DecodedClip> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| MoodError::DecodeFailed(format!("invalid base64: {e}")))?;
    if bytes.is_empty() {
        return Err(MoodError::DecodeFailed("empty audio payload".into()));
    }
    decode_bytes(bytes)
}

fn decode_bytes(bytes: Vec<u8>) -> Result<DecodedClip> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| MoodError::DecodeFailed(format!("failed to probe audio: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| MoodError::DecodeFailed("no default audio track".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| MoodError::DecodeFailed("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| MoodError::DecodeFailed(format!("failed to create decoder: {e}")))?;

    let mut out: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(MoodError::DecodeFailed(format!("audio read error: {e}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphError::DecodeError(_)) => continue,
            Err(e) => return Err(MoodError::DecodeFailed(format!("audio decode error: {e}"))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        let frames = decoded.frames();
        let required = frames.saturating_mul(channels);
        if sample_buf.as_ref().is_none_or(|b| b.capacity() < required) {
            sample_buf = Some(SampleBuffer::<f32>::new(frames as u64, spec));
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.clear();
        buf.copy_interleaved_ref(decoded);

        let data = buf.samples();
        if channels <= 1 {
            out.extend_from_slice(data);
        } else {
            out.extend(
                data.chunks_exact(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        }
    }

    if out.is_empty() {
        return Err(MoodError::DecodeFailed("payload contained no audio frames".into()));
    }
    Ok(DecodedClip {
        samples: out,
        sample_rate,
    })
}
