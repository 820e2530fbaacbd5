//! Microphone capture, reply playback and the codecs between them.
//!
//! Devices sit behind the [`Microphone`] and [`AudioSink`] traits so voice
//! sessions can run against the cpal implementations or test doubles.

pub mod capture;
pub mod decode;
pub mod playback;
pub mod resample;
pub mod wav;

use async_trait::async_trait;

use crate::error::Result;

pub use capture::CpalMicrophone;
pub use playback::CpalSink;

/// Mono recording at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl CapturedAudio {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decoded synthesised reply, ready for an [`AudioSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Source of exclusive microphone captures.
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Opens the capture device and starts recording.
    ///
    /// # Errors
    ///
    /// Returns [`MoodError::PermissionDenied`](crate::error::MoodError::PermissionDenied)
    /// when the device cannot be acquired.
    async fn acquire(&self) -> Result<Box<dyn CaptureHandle>>;
}

/// A recording in progress. Dropping it releases the device.
pub trait CaptureHandle: Send {
    /// Stops capture, releases the device and returns what was recorded.
    fn finish(self: Box<Self>) -> Result<CapturedAudio>;
}

/// Output device for synthesised replies.
pub trait AudioSink: Send + Sync {
    fn start(&self, clip: DecodedClip) -> Result<Box<dyn ActivePlayback>>;
}

/// A clip currently playing. Dropping it stops playback.
pub trait ActivePlayback: Send {
    fn is_finished(&self) -> bool;
    fn stop(self: Box<Self>);
}

/// Names of every input and output device on the default host.
pub fn list_devices() -> Result<(Vec<String>, Vec<String>)> {
    Ok((
        CpalMicrophone::list_input_devices()?,
        CpalSink::list_output_devices()?,
    ))
}
