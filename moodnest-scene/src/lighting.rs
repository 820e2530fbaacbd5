//! Applies mood presets to instrumented lamp fixtures.

use tracing::{debug, warn};

use crate::fixtures::FixtureRegistry;
use crate::graph::SceneGraph;
use crate::mood::{Mood, MoodPreset};

/// Emissive strength is `preset.intensity * EMISSIVE_DAMPING` so glow stays
/// below the highlights at high intensity.
pub const EMISSIVE_DAMPING: f32 = 0.3;

/// What an [`MoodLightingController::apply_preset`] call touched.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightingReport {
    pub preset: MoodPreset,
    pub fixtures_updated: usize,
}

#[derive(Debug, Copy, Clone, Default)]
pub struct MoodLightingController;

impl MoodLightingController {
    pub fn new() -> Self {
        Self
    }

    /// Resolves `label` (unknown labels mean neutral) and applies its preset.
    pub fn apply(
        &self,
        label: &str,
        graph: &mut SceneGraph,
        fixtures: &FixtureRegistry,
    ) -> LightingReport {
        let mood = Mood::from_label(label);
        debug!(label, %mood, "applying mood lighting");
        self.apply_preset(mood.preset(), graph, fixtures)
    }

    /// Sets every fixture's light and emissive material to `preset`.
    ///
    /// Writes absolute values only, so repeating a call is a no-op. With no
    /// fixtures registered this does nothing.
    pub fn apply_preset(
        &self,
        preset: MoodPreset,
        graph: &mut SceneGraph,
        fixtures: &FixtureRegistry,
    ) -> LightingReport {
        let mut updated = 0;
        for fixture in fixtures.iter() {
            let Some(light) = graph
                .node_mut(fixture.light)
                .and_then(|node| node.point_light_mut())
            else {
                warn!(light = fixture.light.0, "fixture light missing from graph");
                continue;
            };
            light.color = preset.color;
            light.intensity = preset.intensity;

            let Some(material) = graph.material_mut(fixture.material) else {
                warn!(material = fixture.material.0, "fixture material missing from graph");
                continue;
            };
            material.base_color = preset.color;
            material.emissive = preset.color;
            material.emissive_intensity = preset.intensity * EMISSIVE_DAMPING;
            updated += 1;
        }

        LightingReport {
            preset,
            fixtures_updated: updated,
        }
    }
}
