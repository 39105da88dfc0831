//! World geometry that particles and blocks collide against
//!
//! Obstructions are immutable for the life of a level. Queries are free
//! functions matched on the shape so every variant is handled explicitly.
//!
//! Normals always point out of the obstruction, toward the side the queried
//! point should end up on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Aabb;

/// Default surface friction (0 = ice, 1 = fully sticky)
pub const DEFAULT_FRICTION: f32 = 0.2;

/// Shape of an obstruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rectangle(Aabb),
    Circle { center: Vec2, radius: f32 },
    /// Placeholder for lattice geometry; never collides
    Lattice,
}

/// A piece of static level geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstruction {
    pub shape: Shape,
    pub friction: f32,
    /// Texture name for the renderer, not used by physics
    #[serde(default)]
    pub texture: Option<String>,
}

impl Obstruction {
    pub fn rectangle(bounds: Aabb) -> Self {
        Self {
            shape: Shape::Rectangle(bounds),
            friction: DEFAULT_FRICTION,
            texture: None,
        }
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self {
            shape: Shape::Circle { center, radius },
            friction: DEFAULT_FRICTION,
            texture: None,
        }
    }

    pub fn lattice() -> Self {
        Self {
            shape: Shape::Lattice,
            friction: DEFAULT_FRICTION,
            texture: None,
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.clamp(0.0, 1.0);
        self
    }

    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = Some(texture.into());
        self
    }
}

/// Rectangle edges, in tie-break priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    fn normal(self) -> Vec2 {
        match self {
            Edge::Top => Vec2::new(0.0, -1.0),
            Edge::Bottom => Vec2::new(0.0, 1.0),
            Edge::Left => Vec2::new(-1.0, 0.0),
            Edge::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Nearest edge of a box to `p` (signed, so points outside pick the side they are past).
///
/// Ties go to the earlier edge in `[Top, Bottom, Left, Right]`: horizontal
/// edges win over vertical ones, which makes corner points resolve vertically.
fn nearest_edge(bounds: &Aabb, p: Vec2) -> (Edge, f32) {
    let candidates = [
        (Edge::Top, p.y - bounds.min.y),
        (Edge::Bottom, bounds.max.y - p.y),
        (Edge::Left, p.x - bounds.min.x),
        (Edge::Right, bounds.max.x - p.x),
    ];
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.1 < best.1 {
            best = *candidate;
        }
    }
    best
}

/// Direction from a circle center to `p`, falling back to "up" at the center
fn radial_direction(center: Vec2, p: Vec2) -> Vec2 {
    let dir = (p - center).normalize_or_zero();
    if dir == Vec2::ZERO {
        Vec2::new(0.0, -1.0)
    } else {
        dir
    }
}

/// Is the point strictly inside the obstruction (boundary counts as outside)
pub fn contains_point(obstruction: &Obstruction, p: Vec2) -> bool {
    match &obstruction.shape {
        Shape::Rectangle(bounds) => bounds.contains_strict(p),
        Shape::Circle { center, radius } => center.distance_squared(p) < radius * radius,
        Shape::Lattice => false,
    }
}

/// Closest point on the obstruction's surface to `p`
pub fn collision_point(obstruction: &Obstruction, p: Vec2) -> Vec2 {
    match &obstruction.shape {
        Shape::Rectangle(bounds) => {
            let (edge, _) = nearest_edge(bounds, p);
            let clamped = bounds.clamp(p);
            match edge {
                Edge::Top => Vec2::new(clamped.x, bounds.min.y),
                Edge::Bottom => Vec2::new(clamped.x, bounds.max.y),
                Edge::Left => Vec2::new(bounds.min.x, clamped.y),
                Edge::Right => Vec2::new(bounds.max.x, clamped.y),
            }
        }
        Shape::Circle { center, radius } => *center + radial_direction(*center, p) * *radius,
        Shape::Lattice => p,
    }
}

/// Outward surface normal at the collision point for `p`
pub fn collision_normal(obstruction: &Obstruction, p: Vec2) -> Vec2 {
    match &obstruction.shape {
        Shape::Rectangle(bounds) => nearest_edge(bounds, p).0.normal(),
        Shape::Circle { center, .. } => radial_direction(*center, p),
        Shape::Lattice => Vec2::ZERO,
    }
}

/// Does a circle overlap the obstruction
pub fn intersects_circle(obstruction: &Obstruction, center: Vec2, radius: f32) -> bool {
    match &obstruction.shape {
        Shape::Rectangle(bounds) => bounds.intersects_circle(center, radius),
        Shape::Circle { center: c, radius: r } => {
            let reach = radius + r;
            c.distance_squared(center) < reach * reach
        }
        Shape::Lattice => false,
    }
}

/// Contact between a circle and an obstruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleContact {
    /// Outward normal (push direction for the circle)
    pub normal: Vec2,
    /// Overlap depth
    pub penetration: f32,
}

/// Contact info for a circle overlapping an obstruction, if any
pub fn circle_contact(
    obstruction: &Obstruction,
    center: Vec2,
    radius: f32,
) -> Option<CircleContact> {
    match &obstruction.shape {
        Shape::Rectangle(bounds) => {
            if bounds.contains(center) {
                // Deep case: center inside, push out through the nearest edge
                let (edge, distance) = nearest_edge(bounds, center);
                return Some(CircleContact {
                    normal: edge.normal(),
                    penetration: distance + radius,
                });
            }
            let closest = bounds.clamp(center);
            let offset = center - closest;
            let distance = offset.length();
            (distance < radius).then(|| CircleContact {
                normal: offset / distance,
                penetration: radius - distance,
            })
        }
        Shape::Circle { center: c, radius: r } => {
            let distance = c.distance(center);
            let reach = radius + r;
            (distance < reach).then(|| CircleContact {
                normal: radial_direction(*c, center),
                penetration: reach - distance,
            })
        }
        Shape::Lattice => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_box() -> Obstruction {
        Obstruction::rectangle(Aabb::new(Vec2::ZERO, Vec2::new(100.0, 50.0)))
    }

    #[test]
    fn test_rectangle_contains_point() {
        let rect = unit_box();
        assert!(contains_point(&rect, Vec2::new(10.0, 10.0)));
        assert!(!contains_point(&rect, Vec2::new(0.0, 10.0)));
        assert!(!contains_point(&rect, Vec2::new(-5.0, 10.0)));
    }

    #[test]
    fn test_rectangle_snaps_to_nearest_edge() {
        let rect = unit_box();
        let p = Vec2::new(97.0, 25.0);
        assert_eq!(collision_point(&rect, p), Vec2::new(100.0, 25.0));
        assert_eq!(collision_normal(&rect, p), Vec2::new(1.0, 0.0));

        let p = Vec2::new(40.0, 2.0);
        assert_eq!(collision_point(&rect, p), Vec2::new(40.0, 0.0));
        assert_eq!(collision_normal(&rect, p), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_rectangle_corner_tie_prefers_horizontal_edge() {
        let rect = unit_box();
        // Equidistant from left and top edges
        let p = Vec2::new(5.0, 5.0);
        assert_eq!(collision_normal(&rect, p), Vec2::new(0.0, -1.0));
        // Equidistant from right and bottom edges
        let p = Vec2::new(95.0, 45.0);
        assert_eq!(collision_normal(&rect, p), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_rectangle_normal_points_toward_outside_query() {
        let rect = unit_box();
        let p = Vec2::new(120.0, 25.0);
        let n = collision_normal(&rect, p);
        assert!(n.dot(p - collision_point(&rect, p)) > 0.0);
    }

    #[test]
    fn test_circle_queries() {
        let circle = Obstruction::circle(Vec2::new(10.0, 10.0), 5.0);
        assert!(contains_point(&circle, Vec2::new(12.0, 10.0)));
        assert!(!contains_point(&circle, Vec2::new(15.0, 10.0)));
        let p = Vec2::new(12.0, 10.0);
        assert!((collision_point(&circle, p) - Vec2::new(15.0, 10.0)).length() < 1e-5);
        assert!((collision_normal(&circle, p) - Vec2::new(1.0, 0.0)).length() < 1e-5);
        // Degenerate query at the center still yields a unit normal
        assert!((collision_normal(&circle, Vec2::new(10.0, 10.0)).length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_is_inert() {
        let lattice = Obstruction::lattice();
        assert!(!contains_point(&lattice, Vec2::ZERO));
        assert!(!intersects_circle(&lattice, Vec2::ZERO, 100.0));
        assert!(circle_contact(&lattice, Vec2::ZERO, 100.0).is_none());
    }

    #[test]
    fn test_circle_contact_with_rectangle() {
        let rect = unit_box();
        let contact = circle_contact(&rect, Vec2::new(105.0, 25.0), 10.0).unwrap();
        assert_eq!(contact.normal, Vec2::new(1.0, 0.0));
        assert!((contact.penetration - 5.0).abs() < 1e-5);
        assert!(circle_contact(&rect, Vec2::new(115.0, 25.0), 10.0).is_none());

        // Center inside the box
        let contact = circle_contact(&rect, Vec2::new(98.0, 25.0), 10.0).unwrap();
        assert_eq!(contact.normal, Vec2::new(1.0, 0.0));
        assert!((contact.penetration - 12.0).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn rectangle_push_out_leaves_interior(x in 0.01f32..99.99, y in 0.01f32..49.99) {
            let rect = unit_box();
            let p = Vec2::new(x, y);
            prop_assume!(contains_point(&rect, p));
            let resolved = collision_point(&rect, p) + 0.01 * collision_normal(&rect, p);
            prop_assert!(!contains_point(&rect, resolved));
        }
    }
}
