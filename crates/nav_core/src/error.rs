//! Error types for the planning pipeline.

use thiserror::Error;

/// Result type alias using [`PlanError`].
pub type Result<T> = std::result::Result<T, PlanError>;

/// Top-level error type for all planning errors.
///
/// Unreachable targets are deliberately *not* an error: the assembler logs
/// and skips them, producing a partial but well-formed plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Obstacle centre coordinates must be multiples of the cell size.
    /// This is a caller-contract violation and rejects the whole request.
    #[error("Obstacle centre must be cell-aligned, got ({x}, {y})")]
    MisalignedObstacle {
        /// X coordinate of the offending centre.
        x: i32,
        /// Y coordinate of the offending centre.
        y: i32,
    },

    /// Request payload did not match any known message form.
    #[error("Malformed request payload: {0}")]
    MalformedRequest(String),

    /// Plan artefact IO or serialization failure.
    #[error("Plan artefact error: {0}")]
    Artefact(String),

    /// Plan artefact was written by an incompatible version.
    #[error("Plan artefact version mismatch: expected {expected}, got {found}")]
    VersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the artefact.
        found: u32,
    },
}
