//! Constraints that particles carry: world collision, play zone bounds and springs

use glam::Vec2;

use super::geometry::Aabb;
use super::obstruction::{self, Obstruction};
use super::particle::{Particle, ParticleId};
use crate::consts::COLLISION_EPSILON;

/// Handle to a constraint inside a `ParticleSystem`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintId(pub(crate) usize);

/// Per-frame world context handed to the physics core
#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
    /// Force applied to every particle this frame (wind, board tilt)
    pub ambient_force: Vec2,
    /// Active level geometry
    pub obstructions: &'a [Obstruction],
    /// Particles are kept inside this box when set
    pub play_zone: Option<Aabb>,
    /// Enable edge-vs-obstruction resolution
    pub line_collisions: bool,
    /// Distance to push particles past an obstruction surface
    pub collision_epsilon: f32,
}

impl Default for Environment<'_> {
    fn default() -> Self {
        Self {
            ambient_force: Vec2::ZERO,
            obstructions: &[],
            play_zone: None,
            line_collisions: false,
            collision_epsilon: COLLISION_EPSILON,
        }
    }
}

impl<'a> Environment<'a> {
    pub fn new(obstructions: &'a [Obstruction]) -> Self {
        Self {
            obstructions,
            ..Default::default()
        }
    }

    pub fn with_ambient_force(mut self, force: Vec2) -> Self {
        self.ambient_force = force;
        self
    }

    pub fn with_play_zone(mut self, zone: Aabb) -> Self {
        self.play_zone = Some(zone);
        self
    }

    pub fn with_line_collisions(mut self, enabled: bool) -> Self {
        self.line_collisions = enabled;
        self
    }
}

/// A rule a particle (or pair of particles) must satisfy
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Keep a particle out of every obstruction
    WorldPoint { particle: ParticleId },
    /// Keep the edge between two particles out of obstructions
    WorldLine { a: ParticleId, b: ParticleId },
    /// Keep a particle inside the play zone
    PlayZone { particle: ParticleId },
    /// Hooke spring between two particles (force only)
    Spring {
        a: ParticleId,
        b: ParticleId,
        rest_length: f32,
        stiffness: f32,
    },
}

impl Constraint {
    /// Particles this constraint acts on
    pub fn particles(&self) -> (ParticleId, Option<ParticleId>) {
        match *self {
            Constraint::WorldPoint { particle } | Constraint::PlayZone { particle } => {
                (particle, None)
            }
            Constraint::WorldLine { a, b } | Constraint::Spring { a, b, .. } => (a, Some(b)),
        }
    }

    /// Force this constraint contributes to `id`
    pub fn force_on(&self, id: ParticleId, particles: &[Particle]) -> Vec2 {
        match *self {
            Constraint::Spring {
                a,
                b,
                rest_length,
                stiffness,
            } => {
                let offset = particles[b.0].position - particles[a.0].position;
                let length = offset.length();
                if length <= f32::EPSILON {
                    return Vec2::ZERO;
                }
                let pull = offset / length * (stiffness * (length - rest_length));
                if id == a {
                    pull
                } else if id == b {
                    -pull
                } else {
                    Vec2::ZERO
                }
            }
            _ => Vec2::ZERO,
        }
    }

    /// Move particles so the constraint holds
    pub fn satisfy(&self, particles: &mut [Particle], env: &Environment) {
        match *self {
            Constraint::WorldPoint { particle } => {
                let p = &mut particles[particle.0];
                p.position = resolve_point(p.position, env);
            }
            Constraint::PlayZone { particle } => {
                if let Some(zone) = env.play_zone {
                    let p = &mut particles[particle.0];
                    if !zone.contains(p.position) {
                        p.position = zone.clamp(p.position);
                    }
                }
            }
            Constraint::WorldLine { a, b } => {
                if env.line_collisions {
                    resolve_line(particles, a, b, env);
                }
            }
            Constraint::Spring { .. } => {}
        }
    }
}

/// Push a point out of every obstruction that contains it
pub fn resolve_point(mut position: Vec2, env: &Environment) -> Vec2 {
    for obstruction in env.obstructions {
        if obstruction::contains_point(obstruction, position) {
            position = obstruction::collision_point(obstruction, position)
                + env.collision_epsilon * obstruction::collision_normal(obstruction, position);
        }
    }
    position
}

/// Edge resolution: when both endpoints are clear but the midpoint is buried,
/// shift both endpoints by the midpoint's push-out.
fn resolve_line(particles: &mut [Particle], a: ParticleId, b: ParticleId, env: &Environment) {
    for obstruction in env.obstructions {
        let pa = particles[a.0].position;
        let pb = particles[b.0].position;
        let mid = (pa + pb) * 0.5;
        if obstruction::contains_point(obstruction, pa)
            || obstruction::contains_point(obstruction, pb)
            || !obstruction::contains_point(obstruction, mid)
        {
            continue;
        }
        let target = obstruction::collision_point(obstruction, mid)
            + env.collision_epsilon * obstruction::collision_normal(obstruction, mid);
        let delta = target - mid;
        particles[a.0].position += delta;
        particles[b.0].position += delta;
    }
}
