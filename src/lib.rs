//! MoodNest: voice mood detection driving live lighting in a 3D apartment.
//!
//! A press-and-hold voice session records the microphone, submits the clip
//! to a remote mood analysis service and lights every lamp fixture of the
//! loaded scene with the detected mood's preset:
//! Microphone → WAV upload → mood result → scene fixtures (+ spoken reply)
//!
//! Scene import, normalisation and fixture lighting live in the
//! `moodnest-scene` crate; this crate owns devices, the service client,
//! session sequencing and the ambient state poller.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod notice;
pub mod playback;
pub mod poller;
pub mod service;
pub mod session;
pub mod stage;

pub use app::MoodNestApp;
pub use config::MoodNestConfig;
pub use error::{MoodError, Result};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use playback::PlaybackManager;
pub use poller::{PollerHandle, StatePoller};
pub use service::{AmbientState, AnalysisMode, AnalysisResult, HttpMoodService, MoodService};
pub use session::{InteractionGate, SessionOutcome, SessionState, VoiceSession};
pub use stage::MoodStage;
