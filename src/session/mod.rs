//! Voice interaction state machine.
//!
//! ```text
//! Idle ──press──▶ Recording ──release──▶ Processing ──▶ Committed ──▶ Idle
//!                                            │
//!                                            ├──▶ AwaitingConfirmation ──press──▶ Recording ...
//!                                            └──▶ Failed ──▶ Idle
//! ```
//!
//! A session only touches lighting on a committed mood. Failures return it
//! to `Idle` and are posted as notices; nothing is retried.

pub mod gate;

use std::sync::Arc;

use moodnest_scene::Mood;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::wav::encode_wav;
use crate::audio::{CaptureHandle, Microphone};
use crate::error::{MoodError, Result};
use crate::notice::{Notice, NoticeBoard, NoticeKind};
use crate::playback::PlaybackManager;
use crate::service::{AnalysisMode, AnalysisResult, MoodService};
use crate::stage::MoodStage;

pub use gate::{InteractionGate, Turn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Processing,
    /// A proposed mood is held, not applied, until a follow-up recording
    /// confirms it.
    AwaitingConfirmation { pending_mood: String },
}

/// How a press/release cycle resolved.
#[derive(Debug)]
pub enum SessionOutcome {
    Committed {
        mood: Mood,
        confidence: Option<f32>,
        /// `confidence` as a whole percentage, as shown to the user.
        confidence_percent: Option<u8>,
    },
    AwaitingConfirmation { pending_mood: String },
    /// The follow-up to a confirmation prompt did not confirm.
    Declined,
    Failed(MoodError),
    /// The request was superseded; its result was discarded.
    Superseded,
    /// Release without an active recording.
    Ignored,
}

/// Everything a session needs from the rest of the app.
#[derive(Clone)]
pub struct SessionDeps {
    pub microphone: Arc<dyn Microphone>,
    pub service: Arc<dyn MoodService>,
    pub playback: PlaybackManager,
    pub stage: MoodStage,
    pub notices: NoticeBoard,
    pub gate: InteractionGate,
}

struct ActiveRecording {
    capture: Box<dyn CaptureHandle>,
    turn: Turn,
    /// Mood awaiting confirmation when this recording began.
    confirming: Option<String>,
}

pub struct VoiceSession {
    id: Uuid,
    mode: AnalysisMode,
    state: SessionState,
    deps: SessionDeps,
    recording: Option<ActiveRecording>,
}

impl VoiceSession {
    pub fn new(mode: AnalysisMode, deps: SessionDeps) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            state: SessionState::Idle,
            deps,
            recording: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The proposed mood while awaiting confirmation.
    pub fn pending_mood(&self) -> Option<&str> {
        match &self.state {
            SessionState::AwaitingConfirmation { pending_mood } => Some(pending_mood),
            _ => None,
        }
    }

    /// Input start: take the gate, stop any reply playback and open the
    /// microphone.
    ///
    /// # Errors
    ///
    /// [`MoodError::SessionBusy`] while any session is recording or
    /// processing; [`MoodError::PermissionDenied`] when the microphone cannot
    /// be acquired, after which the session is `Idle`.
    pub async fn press(&mut self) -> Result<()> {
        let id = self.id;
        if matches!(self.state, SessionState::Recording | SessionState::Processing) {
            return Err(MoodError::SessionBusy);
        }
        let turn = match self.deps.gate.try_begin() {
            Ok(turn) => turn,
            Err(e) => {
                debug!(session = %id, "press rejected, another session is active");
                self.deps.notices.post(Notice::from_error(&e));
                return Err(e);
            }
        };

        self.deps.playback.preempt();

        let confirming = self.pending_mood().map(str::to_owned);
        self.state = SessionState::Recording;
        match self.deps.microphone.acquire().await {
            Ok(capture) => {
                info!(session = %id, mode = ?self.mode, confirming = ?confirming, "recording");
                self.recording = Some(ActiveRecording {
                    capture,
                    turn,
                    confirming,
                });
                Ok(())
            }
            Err(e) => {
                warn!(session = %id, error = %e, "microphone unavailable");
                self.state = SessionState::Idle;
                self.deps.notices.post(Notice::from_error(&e));
                Err(e)
            }
        }
    }

    /// Input release: stop capture, submit, and resolve the result.
    ///
    /// The gate is held until the result is resolved; any synthesised reply
    /// starts after it is released.
    pub async fn release(&mut self) -> SessionOutcome {
        let Some(ActiveRecording {
            capture,
            turn,
            confirming,
        }) = self.recording.take()
        else {
            return SessionOutcome::Ignored;
        };
        let id = self.id;
        self.state = SessionState::Processing;

        let result = match submit(&self.deps, id, self.mode, capture, &turn).await {
            Submitted::Done(result) => result,
            Submitted::Superseded => {
                info!(session = %id, "result discarded, session superseded");
                self.state = SessionState::Idle;
                return SessionOutcome::Superseded;
            }
        };

        let reply_audio = result
            .as_ref()
            .ok()
            .and_then(AnalysisResult::reply_audio)
            .map(str::to_owned);
        let reply_text = result.as_ref().ok().and_then(|r| r.ai_response.clone());
        let outcome = self.resolve(result, confirming);
        drop(turn);

        if let Some(audio) = reply_audio
            && let Err(e) = self.deps.playback.play(&audio)
        {
            warn!(session = %id, error = %e, "reply playback skipped");
        }

        self.post_outcome(&outcome, reply_text.as_deref());
        outcome
    }

    fn resolve(
        &mut self,
        result: Result<AnalysisResult>,
        confirming: Option<String>,
    ) -> SessionOutcome {
        let id = self.id;
        self.state = SessionState::Idle;

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = %id, error = %e, "analysis failed");
                return SessionOutcome::Failed(e);
            }
        };

        if !reply.success {
            let reason = non_empty(reply.error).or(non_empty(reply.message));
            info!(session = %id, reason = ?reason, "service could not detect a mood");
            return SessionOutcome::Failed(MoodError::AnalysisFailed(reason));
        }

        let awaiting = reply.is_awaiting_confirmation();
        let confidence_percent = reply.confidence_percent();
        let detected = non_empty(reply.detected_mood);
        let pending = non_empty(reply.pending_mood);

        if awaiting {
            return match pending.or(detected) {
                Some(pending_mood) => {
                    info!(session = %id, pending = %pending_mood, "awaiting confirmation");
                    self.state = SessionState::AwaitingConfirmation {
                        pending_mood: pending_mood.clone(),
                    };
                    SessionOutcome::AwaitingConfirmation { pending_mood }
                }
                None => SessionOutcome::Failed(MoodError::AnalysisFailed(Some(
                    "confirmation requested without a pending mood".into(),
                ))),
            };
        }

        match detected.or(pending) {
            Some(label) => {
                let mood = self.deps.stage.commit_mood(&label);
                info!(session = %id, %mood, confidence = ?reply.confidence, "mood committed");
                SessionOutcome::Committed {
                    mood,
                    confidence: reply.confidence,
                    confidence_percent,
                }
            }
            None if confirming.is_some() => {
                info!(session = %id, pending = ?confirming, "confirmation declined");
                SessionOutcome::Declined
            }
            None => SessionOutcome::Failed(MoodError::AnalysisFailed(Some(
                "response did not include a mood".into(),
            ))),
        }
    }

    fn post_outcome(&self, outcome: &SessionOutcome, reply_text: Option<&str>) {
        let notice = match outcome {
            SessionOutcome::Committed {
                mood,
                confidence_percent,
                ..
            } => Notice::mood_detected(*mood, *confidence_percent),
            SessionOutcome::AwaitingConfirmation { pending_mood } => {
                Notice::pending_confirmation(pending_mood, reply_text)
            }
            SessionOutcome::Declined => Notice::new(
                NoticeKind::Warning,
                "Mood Unchanged",
                Some("Keeping the current lighting.".into()),
            ),
            SessionOutcome::Failed(e) if e.is_user_visible() => Notice::from_error(e),
            // Transport and device errors show as a plain detection failure.
            SessionOutcome::Failed(_) => Notice::analysis_failed(None),
            SessionOutcome::Superseded | SessionOutcome::Ignored => return,
        };
        self.deps.notices.post(notice);
    }
}

enum Submitted {
    Done(Result<AnalysisResult>),
    Superseded,
}

/// Stops capture, which releases the device before any network I/O, then
/// encodes and uploads. Cancelling the turn wins over the response.
async fn submit(
    deps: &SessionDeps,
    id: Uuid,
    mode: AnalysisMode,
    capture: Box<dyn CaptureHandle>,
    turn: &Turn,
) -> Submitted {
    let wav = capture.finish().and_then(|audio| {
        debug!(session = %id, seconds = audio.duration_secs(), "recording captured");
        encode_wav(&audio)
    });
    let wav = match wav {
        Ok(wav) => wav,
        Err(e) => return Submitted::Done(Err(e)),
    };

    let result = tokio::select! {
        () = turn.cancel_token().cancelled() => return Submitted::Superseded,
        result = deps.service.analyze(mode, wav) => result,
    };

    if !deps.gate.is_current(turn) {
        return Submitted::Superseded;
    }
    Submitted::Done(result)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
