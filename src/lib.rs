//! Battle Bubbles - soft-body bubble physics for a four-player hex board game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (particles, bubbles, board, collision rules)
//! - `tuning`: Data-driven physics balance
//! - `error`: Construction and configuration errors

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::PhysicsError;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the accumulator will accept (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Number of players on a board
    pub const PLAYER_COUNT: usize = 4;

    /// Bubble defaults
    pub const BUBBLE_SEGMENTS: usize = 8;
    pub const BUBBLE_INNER_RADIUS: f32 = 10.0;
    pub const BUBBLE_OUTER_RADIUS: f32 = 20.0;
    /// Coarse bounding radius as a multiple of the outer radius
    pub const MAX_BOUNDING_RADIUS_FACTOR: f32 = 1.5;
    /// Mass of a single spoke particle
    pub const SPOKE_MASS: f32 = 1.0;

    /// Half-lives for the snappy solid form (seconds)
    pub const SOLID_CENTER_HALF_LIFE: f32 = 0.1;
    pub const SOLID_SPOKE_HALF_LIFE: f32 = 0.02;
    /// Half-lives for the floaty bubble form (seconds)
    pub const BUBBLE_CENTER_HALF_LIFE: f32 = 0.4;
    pub const BUBBLE_SPOKE_HALF_LIFE: f32 = 0.07;

    /// Legacy ring spring strengths, kept as bubble properties
    pub const BUBBLE_RING_FORCE: f32 = 1.0;
    pub const BUBBLE_INNER_FORCE: f32 = 1.0;

    /// Offset along the surface normal when pushing a particle out of an obstruction
    pub const COLLISION_EPSILON: f32 = 0.01;

    /// Outward velocity given to a block shoved by a solid player
    pub const SOLID_TO_BLOCK_REPULSION_VELOCITY_COEFF: f32 = 120.0;
    /// Velocity per unit offset applied by a bubble to a block (negative pulls blocks in)
    pub const BUBBLE_TO_BLOCK_REPULSION_VELOCITY_COEFF: f32 = -4.0;

    /// Time spent in the IN_TRANSITION form (seconds)
    pub const FORM_TRANSITION_SECONDS: f32 = 0.15;
    /// Player input acceleration scale (force units per unit stick deflection)
    pub const INPUT_FORCE: f32 = 800.0;

    /// Block defaults
    pub const BLOCK_RADIUS: f32 = 12.0;
    /// Exponential drag applied to free block velocity (1/s)
    pub const BLOCK_DRAG: f32 = 3.0;
    /// Fraction of normal velocity kept when a block bounces
    pub const BLOCK_RESTITUTION: f32 = 0.5;
}

/// Normalize an angle to (-π, π]
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() || (angle > -PI && angle <= PI) {
        return angle;
    }
    let mut a = angle.rem_euclid(TAU);
    if a > PI {
        a -= TAU;
    }
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a <= -PI {
        a += TAU;
    }
    a
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}

/// Blend factor for exponential smoothing toward a target.
///
/// After `half_life` seconds the remaining distance to the target is halved.
/// `dt = 0` gives 0 (no movement).
#[inline]
pub fn half_life_alpha(dt: f32, half_life: f32) -> f32 {
    debug_assert!(half_life > 0.0, "half-life must be positive");
    1.0 - (-dt * std::f32::consts::LN_2 / half_life).exp()
}
