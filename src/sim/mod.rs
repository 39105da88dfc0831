//! Deterministic simulation module
//!
//! All physics and round logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (by player index, block id, slot index)
//! - No rendering, audio or input device dependencies

pub mod board;
pub mod bubble;
pub mod constraint;
pub mod geometry;
pub mod obstruction;
pub mod particle;
pub mod player;
pub mod session;

pub use board::{Block, BlockKind, Board, Slot, SlotFlags};
pub use bubble::{Bubble, Spoke};
pub use constraint::{Constraint, ConstraintId, Environment};
pub use geometry::Aabb;
pub use obstruction::{
    CircleContact, Obstruction, Shape, circle_contact, collision_normal, collision_point,
    contains_point, intersects_circle,
};
pub use particle::{Particle, ParticleId, ParticleSystem};
pub use player::{Form, FormListener, Player, PlayerStats, Transition};
pub use session::{FrameInput, PlayerInput, Session};
