//! Error types for the moodnest-scene crate.

/// Errors raised while importing, normalising or instrumenting a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The asset could not be parsed or is structurally invalid.
    #[error("import error: {0}")]
    Import(String),

    /// The scene contains no mesh geometry to measure.
    #[error("scene has no mesh geometry")]
    EmptyBounds,

    /// The scene bounds have zero extent on every axis.
    #[error("scene bounds are degenerate (zero size)")]
    DegenerateBounds,

    /// A node id does not belong to this graph.
    #[error("unknown scene node: {0}")]
    UnknownNode(usize),
}

/// Convenience type alias for scene results.
pub type Result<T> = std::result::Result<T, SceneError>;
