//! Soft-body bubble: a ring of spokes around a floating center
//!
//! The ring keeps its shape through exponential relaxation rather than rigid
//! constraints. Each frame the center drifts toward the spokes' centroid, the
//! ring's net rotation is measured, and every spoke is blended toward where
//! it would sit on an undistorted, rotated ring. Distortion decays with a
//! half-life, so the bubble squishes on impact and heals back into a circle.
//!
//! Spokes alternate outer/inner radius: even spokes are on the outer ring,
//! odd spokes on the inner ring.

use glam::Vec2;

use super::constraint::{Constraint, Environment};
use super::particle::{Particle, ParticleId, ParticleSystem};
use crate::consts::*;
use crate::error::PhysicsError;
use crate::{half_life_alpha, normalize_angle, polar_to_cartesian};

/// Fewest segments that still form a ring
pub const MIN_SEGMENTS: usize = 3;

/// One particle of the ring, tagged with its undistorted placement
#[derive(Debug, Clone)]
pub struct Spoke {
    pub particle: ParticleId,
    /// Angle around the ring at orientation 0
    pub base_angle: f32,
    /// Inner or outer ring radius
    pub base_radius: f32,
    /// Angle from the center measured on the last update
    pub measured_angle: f32,
}

/// A player's soft-body avatar
#[derive(Debug, Clone)]
pub struct Bubble {
    system: ParticleSystem,
    center: ParticleId,
    spokes: Vec<Spoke>,
    outer_circle: Vec<ParticleId>,
    inner_circle: Vec<ParticleId>,
    segments: usize,
    outer_radius: f32,
    inner_radius: f32,
    max_bounding_radius: f32,
    center_half_life: f32,
    spoke_half_life: f32,
    ring_force: f32,
    inner_force: f32,
    orientation: f32,
}

fn check_half_life(name: &'static str, value: f32) -> Result<f32, PhysicsError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PhysicsError::InvalidHalfLife { name, value })
    }
}

impl Bubble {
    /// Build an undistorted bubble centered on `(x, y)`.
    ///
    /// `force` and `inner_force` are the ring spring strengths carried as
    /// content properties; shape recovery itself is driven by the half-lives.
    pub fn create(
        segments: usize,
        x: f32,
        y: f32,
        inner_radius: f32,
        outer_radius: f32,
        force: f32,
        inner_force: f32,
    ) -> Result<Self, PhysicsError> {
        if segments < MIN_SEGMENTS {
            return Err(PhysicsError::InsufficientSegments(segments));
        }
        if !(inner_radius > 0.0 && inner_radius < outer_radius && outer_radius.is_finite()) {
            return Err(PhysicsError::InvalidRadii {
                inner: inner_radius,
                outer: outer_radius,
            });
        }

        let origin = Vec2::new(x, y);
        let spoke_count = segments * 2;
        let mut system = ParticleSystem::new();
        let center = system.add_particle(origin, segments as f32)?;

        let mut spokes = Vec::with_capacity(spoke_count);
        let mut outer_circle = Vec::with_capacity(segments);
        let mut inner_circle = Vec::with_capacity(segments);
        for i in 0..spoke_count {
            let base_angle = normalize_angle(std::f32::consts::TAU * i as f32 / spoke_count as f32);
            let base_radius = if i % 2 == 0 { outer_radius } else { inner_radius };
            let position = origin + polar_to_cartesian(base_radius, base_angle);
            let particle = system.add_particle(position, SPOKE_MASS)?;
            if let Some(p) = system.get_mut(particle) {
                p.texture_coords = polar_to_cartesian(base_radius / outer_radius * 0.5, base_angle)
                    + Vec2::splat(0.5);
            }
            if i % 2 == 0 {
                outer_circle.push(particle);
            } else {
                inner_circle.push(particle);
            }
            spokes.push(Spoke {
                particle,
                base_angle,
                base_radius,
                measured_angle: base_angle,
            });
        }

        // Every particle avoids obstructions and stays on the board; the outer
        // ring edges get line checks.
        for index in 0..system.len() {
            let particle = ParticleId(index);
            system.add_constraint(Constraint::WorldPoint { particle })?;
            system.add_constraint(Constraint::PlayZone { particle })?;
        }
        for (k, &a) in outer_circle.iter().enumerate() {
            let b = outer_circle[(k + 1) % outer_circle.len()];
            system.add_constraint(Constraint::WorldLine { a, b })?;
        }

        let bubble = Self {
            system,
            center,
            spokes,
            outer_circle,
            inner_circle,
            segments,
            outer_radius,
            inner_radius,
            max_bounding_radius: outer_radius * MAX_BOUNDING_RADIUS_FACTOR,
            center_half_life: BUBBLE_CENTER_HALF_LIFE,
            spoke_half_life: BUBBLE_SPOKE_HALF_LIFE,
            ring_force: force,
            inner_force,
            orientation: 0.0,
        };
        debug_assert!(
            bubble.calculate_orientation().abs() < 1e-4,
            "fresh bubble should have zero orientation"
        );
        Ok(bubble)
    }

    /// Accumulate an external force on every particle for the next step
    pub fn add_static_force(&mut self, force: Vec2) {
        self.system.apply_force_all(force);
    }

    /// Advance one frame
    pub fn process_physics(&mut self, dt: f32, env: &Environment) {
        // No time passed: nothing moves, not even by carried velocity
        if dt <= 0.0 || !dt.is_finite() {
            self.system.clear_forces();
            return;
        }

        if env.ambient_force != Vec2::ZERO {
            self.add_static_force(env.ambient_force);
        }

        self.system.gather_forces();
        self.system.integrate(dt);
        self.system.satisfy_constraints(env);
        self.repair();

        let center_alpha = half_life_alpha(dt, self.center_half_life);
        let average = self.average_position();
        if let Some(center) = self.system.get_mut(self.center) {
            center.blend_toward(average, center_alpha);
        }

        self.orientation = self.measure_orientation(self.orientation);
        self.relax_spokes(dt);

        self.system.clear_forces();
        self.repair();
    }

    /// Blend every spoke toward its ideal position on the rotated ring
    fn relax_spokes(&mut self, dt: f32) {
        let alpha = half_life_alpha(dt, self.spoke_half_life);
        let center = self.center_position();
        let orientation = self.orientation;
        let particles = self.system.particles_mut();
        for spoke in &self.spokes {
            let ideal =
                center + polar_to_cartesian(spoke.base_radius, spoke.base_angle + orientation);
            particles[spoke.particle.0].blend_toward(ideal, alpha);
        }
    }

    /// Net rotation of the ring relative to its construction layout, in (-π, π]
    pub fn calculate_orientation(&self) -> f32 {
        self.measure_orientation_from(0.0).0
    }

    /// Measure rotation around a reference angle so rings that have turned
    /// past ±π keep averaging correctly. Records each spoke's measured angle.
    fn measure_orientation(&mut self, reference: f32) -> f32 {
        let (orientation, angles) = self.measure_orientation_from(reference);
        for (spoke, angle) in self.spokes.iter_mut().zip(angles) {
            spoke.measured_angle = angle;
        }
        orientation
    }

    fn measure_orientation_from(&self, reference: f32) -> (f32, Vec<f32>) {
        let center = self.center_position();
        let particles = self.system.particles();
        let mut total = 0.0;
        let angles: Vec<f32> = self
            .spokes
            .iter()
            .map(|spoke| {
                let offset = particles[spoke.particle.0].position - center;
                let angle = offset.y.atan2(offset.x);
                total += normalize_angle(angle - spoke.base_angle - reference);
                angle
            })
            .collect();
        let orientation = normalize_angle(reference + total / self.spokes.len() as f32);
        (orientation, angles)
    }

    /// Mean of all spoke positions
    pub fn average_position(&self) -> Vec2 {
        let particles = self.system.particles();
        let sum: Vec2 = self.spokes.iter().map(|s| particles[s.particle.0].position).sum();
        sum / self.spokes.len() as f32
    }

    /// Move the whole bubble rigidly and bring it to rest
    pub fn teleport_to(&mut self, position: Vec2) {
        let delta = position - self.center_position();
        for particle in self.system.particles_mut() {
            let target = particle.position + delta;
            particle.teleport(target);
        }
    }

    /// Reset any non-finite particle. Returns how many were repaired.
    pub fn repair(&mut self) -> usize {
        let fallback = self
            .system
            .get(self.center)
            .map(|c| c.last_position)
            .filter(|p| p.is_finite())
            .unwrap_or(Vec2::ZERO);
        let repaired = self.system.sanitize(fallback);
        if repaired > 0 {
            log::warn!("Reset {} non-finite bubble particles", repaired);
        }
        repaired
    }

    pub fn is_finite(&self) -> bool {
        self.system.particles().iter().all(Particle::is_finite)
    }

    /// Change how quickly the center and spokes settle
    pub fn set_half_lives(&mut self, center: f32, spoke: f32) -> Result<(), PhysicsError> {
        self.center_half_life = check_half_life("center_half_life", center)?;
        self.spoke_half_life = check_half_life("spoke_half_life", spoke)?;
        Ok(())
    }

    /// Velocity drag applied to all particles (1/s)
    pub fn set_drag(&mut self, drag: f32) {
        self.system.drag = drag.max(0.0);
    }

    pub fn center_point(&self) -> &Particle {
        &self.system.particles()[self.center.0]
    }

    pub fn center_id(&self) -> ParticleId {
        self.center
    }

    #[inline]
    pub fn center_position(&self) -> Vec2 {
        self.center_point().position
    }

    /// Outer ring particle handles
    pub fn outer_circle(&self) -> &[ParticleId] {
        &self.outer_circle
    }

    /// Inner ring particle handles
    pub fn inner_circle(&self) -> &[ParticleId] {
        &self.inner_circle
    }

    pub fn spokes(&self) -> &[Spoke] {
        &self.spokes
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.system.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.system.get_mut(id)
    }

    pub fn particles(&self) -> &[Particle] {
        self.system.particles()
    }

    /// Undo this step's motion for the given particles
    pub fn freeze(&mut self, ids: &[ParticleId]) {
        for &id in ids {
            if let Some(p) = self.system.get_mut(id) {
                p.freeze();
            }
        }
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn outer_radius(&self) -> f32 {
        self.outer_radius
    }

    pub fn inner_radius(&self) -> f32 {
        self.inner_radius
    }

    pub fn max_bounding_radius(&self) -> f32 {
        self.max_bounding_radius
    }

    pub fn center_half_life(&self) -> f32 {
        self.center_half_life
    }

    pub fn spoke_half_life(&self) -> f32 {
        self.spoke_half_life
    }

    pub fn ring_force(&self) -> f32 {
        self.ring_force
    }

    pub fn inner_force(&self) -> f32 {
        self.inner_force
    }

    /// Orientation measured on the last update
    pub fn orientation(&self) -> f32 {
        self.orientation
    }
}
