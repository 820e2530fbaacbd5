//! Scene side of MoodNest: glTF import, viewing-volume normalisation, lamp
//! fixture detection and mood-driven lighting.

pub mod aabb;
pub mod color;
pub mod error;
pub mod fixtures;
pub mod graph;
pub mod import;
pub mod instance;
pub mod lamps;
pub mod light;
pub mod lighting;
pub mod material;
pub mod mood;
pub mod normalize;

pub use aabb::Aabb;
pub use color::Rgb;
pub use error::{Result, SceneError};
pub use fixtures::{FixtureHandle, FixtureRegistry, LampFixture};
pub use graph::{MeshData, Node, NodeId, NodeKind, SceneGraph, Transform};
pub use import::{import_path, import_slice};
pub use instance::SceneInstance;
pub use lamps::{Classification, LampDetector, DEFAULT_LAMP_KEYWORDS};
pub use light::PointLight;
pub use lighting::{LightingReport, MoodLightingController, EMISSIVE_DAMPING};
pub use material::{Material, MaterialId};
pub use mood::{Mood, MoodPreset};
pub use normalize::{Normalization, NormalizedScene, SceneNormalizer, TARGET_SPAN};
