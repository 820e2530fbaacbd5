//! Shared owner of the live scene and ambient mood state.
//!
//! Voice sessions and the state poller both write lighting through the same
//! [`MoodStage`]. Writes are absolute, so the last write wins and repeating
//! one is harmless.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use moodnest_scene::{LampDetector, Mood, MoodPreset, SceneInstance, SceneNormalizer};
use tracing::{debug, info};

use crate::config::SceneConfig;
use crate::error::Result;
use crate::service::AmbientState;

#[derive(Debug)]
struct StageInner {
    scene: Option<SceneInstance>,
    ambient: AmbientState,
    mood: Option<Mood>,
    lighting: MoodPreset,
}

#[derive(Debug, Clone)]
pub struct MoodStage {
    inner: Arc<Mutex<StageInner>>,
}

impl Default for MoodStage {
    fn default() -> Self {
        Self::new()
    }
}

impl MoodStage {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StageInner {
                scene: None,
                ambient: AmbientState::default(),
                mood: None,
                lighting: Mood::Neutral.preset(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StageInner> {
        // Every write leaves the state consistent, so a poisoned lock is safe to reuse.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Imports, normalises and instruments `path`, replacing any loaded scene.
    ///
    /// The current lighting is replayed onto the new fixtures. Returns the
    /// number of fixtures detected.
    pub fn load_scene(&self, path: &Path, config: &SceneConfig) -> Result<usize> {
        let scene = SceneInstance::load(
            path,
            SceneNormalizer::new(config.target_span),
            LampDetector::with_keywords(&config.lamp_keywords),
        )?;
        Ok(self.install_scene(scene))
    }

    /// Installs an already-built scene, replaying the current lighting.
    pub fn install_scene(&self, mut scene: SceneInstance) -> usize {
        let mut inner = self.lock();
        scene.apply_preset(inner.lighting);
        let count = scene.fixture_count();
        inner.scene = Some(scene);
        info!(fixtures = count, "scene installed");
        count
    }

    /// Applies a confirmed mood to the fixtures and the ambient state.
    ///
    /// Unknown labels resolve to neutral. Without a scene only the state is
    /// updated.
    pub fn commit_mood(&self, label: &str) -> Mood {
        let mood = Mood::from_label(label);
        let preset = mood.preset();
        let mut inner = self.lock();
        let updated = apply_lighting(&mut inner, preset);
        inner.mood = Some(mood);
        inner.ambient.label = mood.as_str().to_owned();
        inner.ambient.color = preset.color;
        inner.ambient.intensity = Some(preset.intensity);
        info!(%mood, fixtures = updated, "mood committed");
        mood
    }

    /// Replaces the ambient state and lights the scene from it.
    ///
    /// A label naming a known mood uses that mood's preset; anything else
    /// uses the state's own colour and intensity.
    pub fn apply_ambient(&self, state: AmbientState) {
        let preset = match state.mood() {
            Some(mood) => mood.preset(),
            None => MoodPreset::new(
                state.color,
                state
                    .intensity
                    .unwrap_or(Mood::Neutral.preset().intensity),
            ),
        };
        let mut inner = self.lock();
        let updated = apply_lighting(&mut inner, preset);
        if let Some(mood) = state.mood() {
            inner.mood = Some(mood);
        }
        debug!(label = %state.label, color = %state.color, fixtures = updated, "ambient state applied");
        inner.ambient = state;
    }

    pub fn ambient(&self) -> AmbientState {
        self.lock().ambient.clone()
    }

    /// Last mood applied by a session or a mood-labelled ambient state.
    pub fn current_mood(&self) -> Option<Mood> {
        self.lock().mood
    }

    /// Colour and intensity currently on the fixtures.
    pub fn lighting(&self) -> MoodPreset {
        self.lock().lighting
    }

    pub fn has_scene(&self) -> bool {
        self.lock().scene.is_some()
    }

    pub fn fixture_count(&self) -> usize {
        self.lock().scene.as_ref().map_or(0, SceneInstance::fixture_count)
    }

    /// Runs `f` against the loaded scene, if any.
    pub fn with_scene<R>(&self, f: impl FnOnce(&SceneInstance) -> R) -> Option<R> {
        self.lock().scene.as_ref().map(f)
    }
}

fn apply_lighting(inner: &mut StageInner, preset: MoodPreset) -> usize {
    inner.lighting = preset;
    inner
        .scene
        .as_mut()
        .map_or(0, |scene| scene.apply_preset(preset).fixtures_updated)
}
