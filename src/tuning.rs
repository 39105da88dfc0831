//! Data-driven physics balance
//!
//! Every field defaults to the matching constant in [`crate::consts`], and
//! the struct deserializes with `#[serde(default)]`, so a JSON document only
//! needs the values it wants to change:
//!
//! ```json
//! { "bubble_spoke_half_life": 0.1, "input_force": 3000.0 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::PhysicsError;

/// Runtime-tunable physics and gameplay values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Bubble shape ===
    pub segments: usize,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub ring_force: f32,
    pub inner_force: f32,
    /// Velocity drag on bubble particles (1/s)
    pub bubble_drag: f32,

    // === Form response ===
    pub solid_center_half_life: f32,
    pub solid_spoke_half_life: f32,
    pub bubble_center_half_life: f32,
    pub bubble_spoke_half_life: f32,
    pub transition_seconds: f32,

    // === Input ===
    pub input_force: f32,

    // === Collision ===
    pub collision_epsilon: f32,
    pub line_collisions: bool,
    pub solid_to_block_repulsion: f32,
    pub bubble_to_block_repulsion: f32,

    // === Blocks ===
    pub block_radius: f32,
    pub block_drag: f32,
    pub block_restitution: f32,
}

/// Drag that keeps held-down input from accelerating a bubble forever
pub const BUBBLE_DRAG: f32 = 4.0;

impl Default for Tuning {
    fn default() -> Self {
        Self {
            segments: BUBBLE_SEGMENTS,
            inner_radius: BUBBLE_INNER_RADIUS,
            outer_radius: BUBBLE_OUTER_RADIUS,
            ring_force: BUBBLE_RING_FORCE,
            inner_force: BUBBLE_INNER_FORCE,
            bubble_drag: BUBBLE_DRAG,

            solid_center_half_life: SOLID_CENTER_HALF_LIFE,
            solid_spoke_half_life: SOLID_SPOKE_HALF_LIFE,
            bubble_center_half_life: BUBBLE_CENTER_HALF_LIFE,
            bubble_spoke_half_life: BUBBLE_SPOKE_HALF_LIFE,
            transition_seconds: FORM_TRANSITION_SECONDS,

            input_force: INPUT_FORCE,

            collision_epsilon: COLLISION_EPSILON,
            line_collisions: false,
            solid_to_block_repulsion: SOLID_TO_BLOCK_REPULSION_VELOCITY_COEFF,
            bubble_to_block_repulsion: BUBBLE_TO_BLOCK_REPULSION_VELOCITY_COEFF,

            block_radius: BLOCK_RADIUS,
            block_drag: BLOCK_DRAG,
            block_restitution: BLOCK_RESTITUTION,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, PhysicsError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PhysicsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, PhysicsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if self.segments < crate::sim::bubble::MIN_SEGMENTS {
            return Err(PhysicsError::InsufficientSegments(self.segments));
        }
        if !(self.inner_radius > 0.0 && self.inner_radius < self.outer_radius) {
            return Err(PhysicsError::InvalidRadii {
                inner: self.inner_radius,
                outer: self.outer_radius,
            });
        }

        let half_lives = [
            ("solid_center_half_life", self.solid_center_half_life),
            ("solid_spoke_half_life", self.solid_spoke_half_life),
            ("bubble_center_half_life", self.bubble_center_half_life),
            ("bubble_spoke_half_life", self.bubble_spoke_half_life),
        ];
        for (name, value) in half_lives {
            if !(value.is_finite() && value > 0.0) {
                return Err(PhysicsError::InvalidHalfLife { name, value });
            }
        }

        let non_negative = [
            ("bubble_drag", self.bubble_drag),
            ("transition_seconds", self.transition_seconds),
            ("collision_epsilon", self.collision_epsilon),
            ("block_radius", self.block_radius),
            ("block_drag", self.block_drag),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PhysicsError::InvalidTuning { name, value });
            }
        }

        let signed = [
            ("input_force", self.input_force),
            ("solid_to_block_repulsion", self.solid_to_block_repulsion),
            ("bubble_to_block_repulsion", self.bubble_to_block_repulsion),
        ];
        for (name, value) in signed {
            if !value.is_finite() {
                return Err(PhysicsError::InvalidTuning { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.block_restitution) {
            return Err(PhysicsError::InvalidTuning {
                name: "block_restitution",
                value: self.block_restitution,
            });
        }
        Ok(())
    }
}
