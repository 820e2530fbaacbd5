use crate::color::Rgb;

/// Index of a material in a [`SceneGraph`](crate::graph::SceneGraph).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

/// PBR surface description (metallic-roughness workflow).
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    pub base_color: Rgb,
    pub emissive: Rgb,
    /// Multiplier applied to `emissive`.
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: Rgb::WHITE,
            emissive: Rgb::BLACK,
            emissive_intensity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
        }
    }
}

impl Material {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_base_color(mut self, color: Rgb) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_emissive(mut self, color: Rgb, intensity: f32) -> Self {
        self.emissive = color;
        self.emissive_intensity = intensity;
        self
    }

    pub fn with_metalness_roughness(mut self, metalness: f32, roughness: f32) -> Self {
        self.metalness = metalness;
        self.roughness = roughness;
        self
    }
}
