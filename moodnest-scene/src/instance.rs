//! A loaded, normalised and instrumented scene.
//!
//! [`SceneInstance`] keeps the imported source graph pristine and owns a
//! working copy plus the fixture registry built from it. Reloading rebuilds
//! the working copy from the source, which replaces every fixture and
//! invalidates handles issued for the previous scene.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::fixtures::{FixtureHandle, FixtureRegistry, LampFixture};
use crate::graph::{NodeId, SceneGraph};
use crate::import;
use crate::lamps::LampDetector;
use crate::lighting::{LightingReport, MoodLightingController};
use crate::mood::{Mood, MoodPreset};
use crate::normalize::{Normalization, SceneNormalizer};

#[derive(Debug, Clone)]
pub struct SceneInstance {
    source: SceneGraph,
    working: SceneGraph,
    root: NodeId,
    normalization: Normalization,
    fixtures: FixtureRegistry,
    normalizer: SceneNormalizer,
    detector: LampDetector,
    controller: MoodLightingController,
}

impl SceneInstance {
    /// Builds an instance from an already-imported source graph.
    ///
    /// # Errors
    ///
    /// Fails when the source has no measurable geometry.
    pub fn from_source(
        source: SceneGraph,
        normalizer: SceneNormalizer,
        detector: LampDetector,
    ) -> Result<Self> {
        let normalized = normalizer.normalize(&source)?;
        let mut working = normalized.graph;
        let lamps = detector.instrument(&mut working)?;
        let mut fixtures = FixtureRegistry::new();
        fixtures.replace_all(lamps);

        info!(
            scale = normalized.normalization.scale,
            fixtures = fixtures.len(),
            "scene instance ready"
        );
        Ok(Self {
            source,
            working,
            root: normalized.root,
            normalization: normalized.normalization,
            fixtures,
            normalizer,
            detector,
            controller: MoodLightingController::new(),
        })
    }

    /// Imports `path` and builds an instance with the given tuning.
    pub fn load(
        path: impl AsRef<Path>,
        normalizer: SceneNormalizer,
        detector: LampDetector,
    ) -> Result<Self> {
        Self::from_source(import::import_path(path)?, normalizer, detector)
    }

    /// Rebuilds the working copy from the untouched source.
    ///
    /// Every [`FixtureHandle`] issued before the call stops resolving.
    pub fn reload(&mut self) -> Result<()> {
        let normalized = self.normalizer.normalize(&self.source)?;
        let mut working = normalized.graph;
        let lamps = self.detector.instrument(&mut working)?;

        self.working = working;
        self.root = normalized.root;
        self.normalization = normalized.normalization;
        self.fixtures.replace_all(lamps);
        info!(fixtures = self.fixtures.len(), "scene instance reloaded");
        Ok(())
    }

    /// Applies the preset for `label`; unknown labels mean neutral.
    pub fn apply_mood(&mut self, label: &str) -> LightingReport {
        self.controller
            .apply(label, &mut self.working, &self.fixtures)
    }

    pub fn apply_preset(&mut self, preset: MoodPreset) -> LightingReport {
        self.controller
            .apply_preset(preset, &mut self.working, &self.fixtures)
    }

    pub fn source(&self) -> &SceneGraph {
        &self.source
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.working
    }

    /// The wrapping group that carries the normalisation transform.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    pub fn fixture_handles(&self) -> Vec<FixtureHandle> {
        self.fixtures.handles()
    }

    pub fn fixture(&self, handle: FixtureHandle) -> Option<&LampFixture> {
        self.fixtures.get(handle)
    }

    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    /// Current light colour and intensity of a fixture, for inspection.
    pub fn fixture_preset(&self, handle: FixtureHandle) -> Option<MoodPreset> {
        let fixture = self.fixtures.get(handle)?;
        let light = self.working.node(fixture.light)?.point_light()?;
        Some(MoodPreset::new(light.color, light.intensity))
    }

    /// Names of every classified fixture mesh, in traversal order.
    pub fn fixture_names(&self) -> Vec<&str> {
        self.fixtures
            .iter()
            .filter_map(|f| self.working.node(f.mesh).map(|n| n.name.as_str()))
            .collect()
    }

    /// True when every fixture currently shows `mood`'s preset.
    pub fn shows(&self, mood: Mood) -> bool {
        let preset = mood.preset();
        self.fixture_handles()
            .into_iter()
            .all(|h| self.fixture_preset(h) == Some(preset))
    }
}
