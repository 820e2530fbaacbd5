//! Wiring of devices, service client and shared state into one app.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::audio::{AudioSink, CpalMicrophone, CpalSink, Microphone};
use crate::config::MoodNestConfig;
use crate::error::Result;
use crate::notice::NoticeBoard;
use crate::playback::PlaybackManager;
use crate::poller::{PollerHandle, StatePoller};
use crate::service::{AnalysisMode, HttpMoodService, MoodService};
use crate::session::{InteractionGate, SessionDeps, VoiceSession};
use crate::stage::MoodStage;

/// Shared state behind every voice session and the state poller.
pub struct MoodNestApp {
    config: MoodNestConfig,
    deps: SessionDeps,
}

impl MoodNestApp {
    /// Builds the app on the cpal devices and the HTTP service.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration or when the HTTP client cannot be built.
    pub fn from_config(config: MoodNestConfig) -> Result<Self> {
        config.validate()?;
        let service = Arc::new(HttpMoodService::new(&config.service)?);
        let microphone = Arc::new(CpalMicrophone::new(&config.audio));
        let sink = Arc::new(CpalSink::new(&config.audio));
        info!(service = %service.base_url(), "mood service configured");
        Ok(Self::with_parts(config, microphone, sink, service))
    }

    /// Builds the app on caller-supplied devices and service.
    pub fn with_parts(
        config: MoodNestConfig,
        microphone: Arc<dyn Microphone>,
        sink: Arc<dyn AudioSink>,
        service: Arc<dyn MoodService>,
    ) -> Self {
        let deps = SessionDeps {
            microphone,
            service,
            playback: PlaybackManager::new(sink),
            stage: MoodStage::new(),
            notices: NoticeBoard::new(config.notices.dismiss_after()),
            gate: InteractionGate::new(),
        };
        Self { config, deps }
    }

    pub fn config(&self) -> &MoodNestConfig {
        &self.config
    }

    /// Loads the configured asset, or `path` when given.
    pub fn load_scene(&self, path: Option<&Path>) -> Result<usize> {
        let path = path.unwrap_or(&self.config.scene.asset_path);
        self.deps.stage.load_scene(path, &self.config.scene)
    }

    /// A new session in the configured mode.
    pub fn new_session(&self) -> VoiceSession {
        self.new_session_with_mode(self.config.voice.mode)
    }

    pub fn new_session_with_mode(&self, mode: AnalysisMode) -> VoiceSession {
        VoiceSession::new(mode, self.deps.clone())
    }

    /// Starts the ambient state poller, or returns `None` when disabled.
    pub fn spawn_poller(&self, cancel: CancellationToken) -> Option<PollerHandle> {
        if !self.config.poller.enabled {
            return None;
        }
        let poller = StatePoller::new(
            Arc::clone(&self.deps.service),
            self.deps.stage.clone(),
            self.config.poller.interval(),
            cancel,
        );
        Some(poller.spawn())
    }

    pub fn service(&self) -> &Arc<dyn MoodService> {
        &self.deps.service
    }

    pub fn stage(&self) -> &MoodStage {
        &self.deps.stage
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.deps.notices
    }

    pub fn gate(&self) -> &InteractionGate {
        &self.deps.gate
    }

    pub fn playback(&self) -> &PlaybackManager {
        &self.deps.playback
    }
}
