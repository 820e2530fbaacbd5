use crate::color::Rgb;

/// Point light that radiates in all directions from its node's position.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub color: Rgb,
    pub intensity: f32,
    /// Maximum range of the light. 0.0 means infinite range.
    pub distance: f32,
    /// Physical falloff exponent.
    pub decay: f32,
    pub cast_shadow: bool,
}

impl PointLight {
    /// Creates a new point light with explicit intensity and infinite range.
    pub fn new(color: Rgb, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            distance: 0.0,
            decay: 2.0,
            cast_shadow: false,
        }
    }

    /// Creates a new point light with explicit intensity and range.
    pub fn with_range(color: Rgb, intensity: f32, distance: f32) -> Self {
        Self {
            distance,
            ..Self::new(color, intensity)
        }
    }
}
