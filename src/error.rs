//! Error types for construction and configuration.
//!
//! Numerical trouble during a frame is never reported here: particles are
//! repaired in place. These errors cover content and programmer mistakes
//! that should fail fast.

use thiserror::Error;

/// Errors that can occur while building or configuring the simulation.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// A bubble needs at least 3 segments to form a ring.
    #[error("bubble needs at least 3 segments, got {0}")]
    InsufficientSegments(usize),
    /// Inner radius must be positive and smaller than the outer radius.
    #[error("invalid bubble radii: inner {inner} must be in (0, outer {outer})")]
    InvalidRadii { inner: f32, outer: f32 },
    /// Half-lives drive an exponential decay and must be positive and finite.
    #[error("half-life `{name}` must be positive and finite, got {value}")]
    InvalidHalfLife { name: &'static str, value: f32 },
    /// Particle mass must be positive and finite.
    #[error("particle mass must be positive and finite, got {0}")]
    InvalidMass(f32),
    /// A tuning value is outside its usable range.
    #[error("tuning value `{name}` out of range: {value}")]
    InvalidTuning { name: &'static str, value: f32 },
    /// A particle handle does not belong to this system.
    #[error("particle {index} out of bounds (count: {count})")]
    UnknownParticle { index: usize, count: usize },
    /// A slot handle does not exist on the board.
    #[error("slot {0} does not exist")]
    UnknownSlot(usize),
    /// Tuning JSON could not be parsed.
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    /// Tuning file could not be read.
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
}
