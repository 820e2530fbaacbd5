//! Lamp fixture classification and instrumentation.
//!
//! Two classification layers:
//!
//! 1. **Explicit tag**: the asset marks a node with `{"fixture": true|false}`
//!    in its glTF extras. A tag always wins, including a `false` tag on a
//!    node whose name looks like a lamp.
//! 2. **Keyword fallback**: the lowercase node name is scanned for any of the
//!    configured keywords.
//!
//! Every classified lamp gets shadow casting/receiving, its own emissive
//! material, and exactly one point light added as a sibling at the mesh's
//! local position.

use tracing::{debug, info};

use crate::color::Rgb;
use crate::error::{Result, SceneError};
use crate::fixtures::LampFixture;
use crate::graph::{Node, NodeKind, SceneGraph, Transform};
use crate::light::PointLight;
use crate::material::Material;
use crate::mood::Mood;

/// Default name keywords for the fallback classifier.
pub const DEFAULT_LAMP_KEYWORDS: &[&str] = &["lamp", "light", "bulb", "fixture", "pendant", "sconce"];

/// Emissive strength given to a freshly instrumented lamp.
pub const LAMP_EMISSIVE_INTENSITY: f32 = 0.5;
pub const LAMP_METALNESS: f32 = 0.1;
pub const LAMP_ROUGHNESS: f32 = 0.4;
/// Range of each fixture's point light, in normalised scene units.
pub const LAMP_LIGHT_DISTANCE: f32 = 5.0;

/// Why a node was (or was not) classified as a lamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The asset carries an explicit fixture tag.
    Tagged(bool),
    /// The name contains this keyword.
    Keyword(String),
    /// Neither tagged nor matched.
    Unmatched,
}

impl Classification {
    pub fn is_lamp(&self) -> bool {
        match self {
            Self::Tagged(tag) => *tag,
            Self::Keyword(_) => true,
            Self::Unmatched => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LampDetector {
    keywords: Vec<String>,
}

impl Default for LampDetector {
    fn default() -> Self {
        Self::with_keywords(DEFAULT_LAMP_KEYWORDS.iter().copied())
    }
}

impl LampDetector {
    /// Builds a detector from a keyword list (lowercased, blanks dropped).
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Classifies a node by its explicit tag, else by its name.
    pub fn classify(&self, node: &Node) -> Classification {
        if let Some(tag) = node.fixture_tag {
            return Classification::Tagged(tag);
        }
        self.classify_name(&node.name)
    }

    /// Keyword layer only: pure function of the name string.
    pub fn classify_name(&self, name: &str) -> Classification {
        let lower = name.to_lowercase();
        match self.keywords.iter().find(|kw| lower.contains(kw.as_str())) {
            Some(kw) => Classification::Keyword(kw.clone()),
            None => Classification::Unmatched,
        }
    }

    /// Walks every mesh once, instruments each lamp and returns the
    /// `(mesh, light)` pairs in traversal order.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] if the graph is internally
    /// inconsistent.
    pub fn instrument(&self, graph: &mut SceneGraph) -> Result<Vec<LampFixture>> {
        let initial = Mood::Neutral.preset();
        let mut fixtures = Vec::new();

        for mesh_id in graph.mesh_nodes() {
            let node = graph.node(mesh_id).ok_or(SceneError::UnknownNode(mesh_id.0))?;
            let classification = self.classify(node);
            if !classification.is_lamp() {
                continue;
            }

            let name = node.name.clone();
            let parent = node.parent();
            let position = node.transform.translation;
            debug!(node = %name, ?classification, "classified lamp fixture");

            let material = graph.add_material(lamp_material(&name, initial.color));
            if let Some(mesh) = graph.node_mut(mesh_id).and_then(Node::mesh_mut) {
                mesh.material = material;
                mesh.cast_shadow = true;
                mesh.receive_shadow = true;
            }

            let light = graph.add_node(
                parent,
                format!("{name}-light"),
                Transform::from_translation(position),
                NodeKind::PointLight(PointLight::with_range(
                    initial.color,
                    initial.intensity,
                    LAMP_LIGHT_DISTANCE,
                )),
            )?;

            fixtures.push(LampFixture {
                mesh: mesh_id,
                light,
                material,
            });
        }

        info!(count = fixtures.len(), "lamp fixtures instrumented");
        Ok(fixtures)
    }
}

fn lamp_material(name: &str, color: Rgb) -> Material {
    Material::default()
        .with_name(format!("{name}-emissive"))
        .with_base_color(color)
        .with_emissive(color, LAMP_EMISSIVE_INTENSITY)
        .with_metalness_roughness(LAMP_METALNESS, LAMP_ROUGHNESS)
}
