//! Verlet particles and the arena that owns them
//!
//! Velocity is implicit (`position - last_position`). Positional corrections
//! that should not turn into motion go through `translate`, which moves both
//! positions together.

use glam::Vec2;

use super::constraint::{Constraint, ConstraintId, Environment};
use crate::error::PhysicsError;

/// Handle to a particle inside a `ParticleSystem`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub(crate) usize);

impl ParticleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A point mass with implicit velocity
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec2,
    pub last_position: Vec2,
    /// Accumulated force, cleared after integration
    pub force: Vec2,
    mass: f32,
    inv_mass: f32,
    /// Rendering hint, not used by physics
    pub texture_coords: Vec2,
    constraints: Vec<ConstraintId>,
}

impl Particle {
    pub fn new(position: Vec2, mass: f32) -> Result<Self, PhysicsError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(PhysicsError::InvalidMass(mass));
        }
        Ok(Self {
            position,
            last_position: position,
            force: Vec2::ZERO,
            mass,
            inv_mass: 1.0 / mass,
            texture_coords: Vec2::ZERO,
            constraints: Vec::new(),
        })
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Constraints attached to this particle
    pub fn constraints(&self) -> &[ConstraintId] {
        &self.constraints
    }

    /// Displacement over the last step
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.position - self.last_position
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Verlet step with exponential velocity drag (`drag` in 1/s).
    ///
    /// A step that would produce a non-finite position is discarded and the
    /// particle is brought to rest where it is.
    pub fn integrate(&mut self, dt: f32, drag: f32) {
        let acceleration = self.force * self.inv_mass;
        let velocity = self.velocity() * (-drag * dt).exp();
        let next = self.position + velocity + acceleration * (dt * dt);
        self.force = Vec2::ZERO;

        if !next.is_finite() {
            log::warn!(
                "Discarding non-finite integration step at {:?} (force {:?})",
                self.position,
                acceleration * self.mass
            );
            self.last_position = self.position;
            return;
        }
        self.last_position = self.position;
        self.position = next;
    }

    /// Move to a point and come to rest there
    pub fn teleport(&mut self, position: Vec2) {
        self.position = position;
        self.last_position = position;
    }

    /// Undo this step's motion
    pub fn freeze(&mut self) {
        self.position = self.last_position;
    }

    /// Shift without changing velocity
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
        self.last_position += delta;
    }

    /// Exponentially blend toward `target` without injecting velocity
    pub fn blend_toward(&mut self, target: Vec2, alpha: f32) {
        self.translate((target - self.position) * alpha);
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.last_position.is_finite()
    }

    /// Restore finite state: fall back to the last position, then to `fallback`.
    ///
    /// Returns true if anything had to be repaired.
    pub fn sanitize(&mut self, fallback: Vec2) -> bool {
        if self.is_finite() {
            return false;
        }
        let good = if self.position.is_finite() {
            self.position
        } else if self.last_position.is_finite() {
            self.last_position
        } else {
            fallback
        };
        self.teleport(good);
        self.force = Vec2::ZERO;
        true
    }
}

/// Owns particles and the constraints between them
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    constraints: Vec<Constraint>,
    /// Velocity drag applied during integration (1/s)
    pub drag: f32,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drag(mut self, drag: f32) -> Self {
        self.drag = drag.max(0.0);
        self
    }

    pub fn add_particle(&mut self, position: Vec2, mass: f32) -> Result<ParticleId, PhysicsError> {
        let particle = Particle::new(position, mass)?;
        self.particles.push(particle);
        Ok(ParticleId(self.particles.len() - 1))
    }

    /// Register a constraint and attach it to every particle it touches
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintId, PhysicsError> {
        let count = self.particles.len();
        let (first, second) = constraint.particles();
        for id in std::iter::once(first).chain(second) {
            if id.0 >= count {
                return Err(PhysicsError::UnknownParticle { index: id.0, count });
            }
        }

        let constraint_id = ConstraintId(self.constraints.len());
        self.constraints.push(constraint);
        self.particles[first.0].constraints.push(constraint_id);
        if let Some(second) = second {
            self.particles[second.0].constraints.push(constraint_id);
        }
        Ok(constraint_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id.0)
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id.0)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Apply the same force to every particle
    pub fn apply_force_all(&mut self, force: Vec2) {
        for particle in &mut self.particles {
            particle.apply_force(force);
        }
    }

    /// Pull in force contributions from attached constraints
    pub fn gather_forces(&mut self) {
        let contributions: Vec<Vec2> = self
            .particles
            .iter()
            .enumerate()
            .map(|(index, particle)| {
                particle
                    .constraints
                    .iter()
                    .map(|cid| self.constraints[cid.0].force_on(ParticleId(index), &self.particles))
                    .sum()
            })
            .collect();

        for (particle, force) in self.particles.iter_mut().zip(contributions) {
            particle.force += force;
        }
    }

    pub fn integrate(&mut self, dt: f32) {
        let drag = self.drag;
        for particle in &mut self.particles {
            particle.integrate(dt, drag);
        }
    }

    /// Resolve every positional constraint against the environment, in registration order
    pub fn satisfy_constraints(&mut self, env: &Environment) {
        for constraint in &self.constraints {
            constraint.satisfy(&mut self.particles, env);
        }
    }

    pub fn clear_forces(&mut self) {
        for particle in &mut self.particles {
            particle.force = Vec2::ZERO;
        }
    }

    /// Repair non-finite particles. Returns how many were reset.
    pub fn sanitize(&mut self, fallback: Vec2) -> usize {
        self.particles
            .iter_mut()
            .map(|p| p.sanitize(fallback))
            .filter(|&repaired| repaired)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_mass() {
        assert!(matches!(Particle::new(Vec2::ZERO, 0.0), Err(PhysicsError::InvalidMass(_))));
        assert!(Particle::new(Vec2::ZERO, f32::NAN).is_err());
    }

    #[test]
    fn test_integrate_constant_force() {
        let mut p = Particle::new(Vec2::ZERO, 2.0).unwrap();
        p.apply_force(Vec2::new(4.0, 0.0));
        p.integrate(0.5, 0.0);
        // a = 2, x = a * dt^2
        assert!((p.position.x - 0.5).abs() < 1e-6);
        assert_eq!(p.force, Vec2::ZERO);

        // Velocity carries over to the next step
        p.integrate(0.5, 0.0);
        assert!((p.position.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_integrate_discards_non_finite_step() {
        let mut p = Particle::new(Vec2::new(3.0, 4.0), 1.0).unwrap();
        p.apply_force(Vec2::new(f32::INFINITY, 0.0));
        p.integrate(0.1, 0.0);
        assert_eq!(p.position, Vec2::new(3.0, 4.0));
        assert!(p.is_finite());
    }

    #[test]
    fn test_sanitize_prefers_last_position() {
        let mut p = Particle::new(Vec2::new(1.0, 1.0), 1.0).unwrap();
        p.position = Vec2::new(f32::NAN, 0.0);
        assert!(p.sanitize(Vec2::ZERO));
        assert_eq!(p.position, Vec2::new(1.0, 1.0));

        p.position = Vec2::NAN;
        p.last_position = Vec2::NAN;
        assert!(p.sanitize(Vec2::new(7.0, 7.0)));
        assert_eq!(p.position, Vec2::new(7.0, 7.0));
        assert!(!p.sanitize(Vec2::ZERO));
    }

    #[test]
    fn test_translate_keeps_velocity() {
        let mut p = Particle::new(Vec2::ZERO, 1.0).unwrap();
        p.last_position = Vec2::new(-1.0, 0.0);
        p.translate(Vec2::new(0.0, 5.0));
        assert_eq!(p.velocity(), Vec2::new(1.0, 0.0));
        p.freeze();
        assert_eq!(p.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_add_constraint_validates_handles() {
        let mut system = ParticleSystem::new();
        let a = system.add_particle(Vec2::ZERO, 1.0).unwrap();
        let bogus = ParticleId(5);
        let err = system.add_constraint(Constraint::Spring {
            a,
            b: bogus,
            rest_length: 1.0,
            stiffness: 1.0,
        });
        assert!(matches!(err, Err(PhysicsError::UnknownParticle { index: 5, count: 1 })));
        assert!(system.constraints().is_empty());
    }

    #[test]
    fn test_spring_forces_are_gathered() {
        let mut system = ParticleSystem::new();
        let a = system.add_particle(Vec2::ZERO, 1.0).unwrap();
        let b = system.add_particle(Vec2::new(3.0, 0.0), 1.0).unwrap();
        system
            .add_constraint(Constraint::Spring {
                a,
                b,
                rest_length: 2.0,
                stiffness: 10.0,
            })
            .unwrap();
        assert_eq!(system.get(a).unwrap().constraints().len(), 1);

        system.gather_forces();
        // Stretched by 1: pulled together
        assert!((system.get(a).unwrap().force - Vec2::new(10.0, 0.0)).length() < 1e-5);
        assert!((system.get(b).unwrap().force - Vec2::new(-10.0, 0.0)).length() < 1e-5);

        system.clear_forces();
        assert_eq!(system.get(a).unwrap().force, Vec2::ZERO);
    }
}
