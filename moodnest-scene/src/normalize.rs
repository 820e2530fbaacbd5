//! Fits an arbitrary asset into a fixed-size viewing volume centred at the
//! origin.
//!
//! The normaliser never touches the source graph: it measures the source's
//! world bounds, takes a working copy and wraps the copy's roots in a single
//! group carrying `scale = target_span / max_extent` and
//! `position = -center * scale`. Because the transform is derived from the
//! untouched source every time, normalising the same asset twice yields the
//! same result.

use cgmath::{EuclideanSpace, Vector3};
use tracing::debug;

use crate::aabb::Aabb;
use crate::error::{Result, SceneError};
use crate::graph::{NodeId, SceneGraph, Transform};

/// Edge length of the cube the asset's largest dimension is fitted to.
pub const TARGET_SPAN: f32 = 3.7;

/// Name given to the wrapping group node.
pub const NORMALIZED_ROOT_NAME: &str = "normalized-root";

/// Transform derived for one asset.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Normalization {
    /// Bounds of the source asset before normalisation.
    pub source_bounds: Aabb,
    /// Uniform scale applied to the wrapping group.
    pub scale: f32,
    /// Translation applied to the wrapping group.
    pub offset: Vector3<f32>,
}

impl Normalization {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.offset).with_uniform_scale(self.scale)
    }
}

/// A normalised working copy of a source scene.
#[derive(Debug, Clone)]
pub struct NormalizedScene {
    pub graph: SceneGraph,
    pub root: NodeId,
    pub normalization: Normalization,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneNormalizer {
    target_span: f32,
}

impl Default for SceneNormalizer {
    fn default() -> Self {
        Self::new(TARGET_SPAN)
    }
}

impl SceneNormalizer {
    pub fn new(target_span: f32) -> Self {
        Self { target_span }
    }

    pub fn target_span(&self) -> f32 {
        self.target_span
    }

    /// Computes the normalisation transform for `source` without mutating it.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EmptyBounds`] when the scene has no meshes and
    /// [`SceneError::DegenerateBounds`] when every extent is zero.
    pub fn measure(&self, source: &SceneGraph) -> Result<Normalization> {
        let bounds = source.world_bounds().ok_or(SceneError::EmptyBounds)?;
        let max_extent = bounds.max_extent();
        if !(max_extent.is_finite() && max_extent > 0.0) {
            return Err(SceneError::DegenerateBounds);
        }

        let scale = self.target_span / max_extent;
        let offset = -bounds.center().to_vec() * scale;
        debug!(
            max_extent,
            scale,
            center = ?bounds.center(),
            "computed scene normalization"
        );

        Ok(Normalization {
            source_bounds: bounds,
            scale,
            offset,
        })
    }

    /// Produces a normalised working copy of `source`.
    pub fn normalize(&self, source: &SceneGraph) -> Result<NormalizedScene> {
        let normalization = self.measure(source)?;
        let mut graph = source.clone();
        let root = graph.wrap_roots(NORMALIZED_ROOT_NAME, normalization.transform());
        Ok(NormalizedScene {
            graph,
            root,
            normalization,
        })
    }
}
