//! Transient result notices shown after each voice interaction.
//!
//! A [`NoticeBoard`] holds at most one notice. Posting replaces whatever is
//! showing, and a notice disappears on its own once the dismiss delay has
//! elapsed.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use moodnest_scene::Mood;

use crate::error::MoodError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    MoodDetected,
    PendingConfirmation,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub detail: Option<String>,
    pub raised_at: Instant,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            detail,
            raised_at: Instant::now(),
        }
    }

    pub fn mood_detected(mood: Mood, confidence_percent: Option<u8>) -> Self {
        Self::new(
            NoticeKind::MoodDetected,
            capitalize(mood.as_str()),
            confidence_percent.map(|p| format!("{p}% confidence")),
        )
    }

    pub fn pending_confirmation(pending_mood: &str, prompt: Option<&str>) -> Self {
        Self::new(
            NoticeKind::PendingConfirmation,
            format!("Switch to {}?", capitalize(pending_mood)),
            prompt.map(str::to_owned),
        )
    }

    /// The service could not produce a mood for the recording.
    pub fn analysis_failed(reason: Option<&str>) -> Self {
        Self::new(
            NoticeKind::Warning,
            "Unable to Detect Mood",
            Some(
                reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or("Recording not suitable for mood detection")
                    .to_owned(),
            ),
        )
    }

    pub fn from_error(err: &MoodError) -> Self {
        match err {
            MoodError::AnalysisFailed(reason) => Self::analysis_failed(reason.as_deref()),
            MoodError::PermissionDenied(_) => Self::new(
                NoticeKind::Error,
                "Microphone Unavailable",
                Some("Could not access microphone. Please check permissions.".into()),
            ),
            MoodError::SessionBusy => Self::new(
                NoticeKind::Warning,
                "Still Listening",
                Some("Wait for the current recording to finish.".into()),
            ),
            other => Self::new(NoticeKind::Error, "Something Went Wrong", Some(other.to_string())),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct NoticeBoard {
    current: Arc<Mutex<Option<Notice>>>,
    dismiss_after: Duration,
}

impl NoticeBoard {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            dismiss_after,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Notice>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn post(&self, notice: Notice) {
        tracing::debug!(kind = ?notice.kind, title = %notice.title, "notice posted");
        *self.lock() = Some(notice);
    }

    /// The showing notice, or `None` once it has expired.
    pub fn current(&self) -> Option<Notice> {
        let mut slot = self.lock();
        if slot
            .as_ref()
            .is_some_and(|n| n.raised_at.elapsed() >= self.dismiss_after)
        {
            *slot = None;
        }
        slot.clone()
    }

    pub fn dismiss(&self) {
        *self.lock() = None;
    }
}
