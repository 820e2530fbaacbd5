//! At-most-one synthesised reply playback.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::audio::decode::decode_reply;
use crate::audio::{ActivePlayback, AudioSink};
use crate::error::Result;

/// Owns the single active reply. Starting a new one, or a new recording,
/// stops the previous one first.
#[derive(Clone)]
pub struct PlaybackManager {
    sink: Arc<dyn AudioSink>,
    active: Arc<Mutex<Option<Box<dyn ActivePlayback>>>>,
}

impl std::fmt::Debug for PlaybackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("playing", &self.is_playing())
            .finish()
    }
}

impl PlaybackManager {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            sink,
            active: Arc::new(Mutex::new(None)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn ActivePlayback>>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decodes a base64 reply and plays it, stopping any current reply first.
    ///
    /// # Errors
    ///
    /// Returns [`MoodError::DecodeFailed`](crate::error::MoodError::DecodeFailed)
    /// for a malformed payload; nothing plays in that case.
    pub fn play(&self, payload: &str) -> Result<()> {
        self.preempt();
        let clip = decode_reply(payload)?;
        let seconds = clip.samples.len() as f32 / clip.sample_rate.max(1) as f32;
        let handle = self.sink.start(clip)?;

        let mut slot = self.lock();
        if let Some(previous) = slot.replace(handle) {
            previous.stop();
        }
        info!(seconds, "reply playback started");
        Ok(())
    }

    /// Stops and releases the current reply. Returns whether one was playing.
    pub fn preempt(&self) -> bool {
        let Some(active) = self.lock().take() else {
            return false;
        };
        let was_playing = !active.is_finished();
        active.stop();
        if was_playing {
            debug!("reply playback preempted");
        }
        was_playing
    }

    /// Whether a reply is still audible. Finished replies are released here.
    pub fn is_playing(&self) -> bool {
        let mut slot = self.lock();
        if slot.as_ref().is_some_and(|p| p.is_finished())
            && let Some(done) = slot.take()
        {
            done.stop();
        }
        slot.is_some()
    }
}
