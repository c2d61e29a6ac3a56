//! Shared physical capability of all entities.

use glam::Vec2;
use protocol::Color;

/// Radius derived from mass. Mass is the primitive quantity everywhere;
/// no code path sets a radius directly.
#[inline]
pub fn radius_of(mass: f32) -> f32 {
    mass.sqrt()
}

/// Mass corresponding to a radius.
#[inline]
pub fn mass_of(radius: f32) -> f32 {
    radius * radius
}

/// Common physical data composed into every entity kind.
#[derive(Debug, Clone)]
pub struct Body {
    /// Center position in world coordinates.
    pub position: Vec2,
    /// Mass (the primitive quantity).
    mass: f32,
    /// Radius, always `sqrt(mass)`.
    radius: f32,
    /// Entity color.
    pub color: Color,
}

impl Body {
    /// Create a body. Precondition: `mass > 0`.
    pub fn new(position: Vec2, mass: f32, color: Color) -> Self {
        debug_assert!(mass > 0.0, "entity mass must be positive");
        Self {
            position,
            mass,
            radius: radius_of(mass),
            color,
        }
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Add `delta` to the mass and recompute the radius.
    /// Precondition: the resulting mass stays positive.
    pub fn apply_mass_delta(&mut self, delta: f32) {
        let next = self.mass + delta;
        debug_assert!(next > 0.0, "mass delta {delta} would zero out the entity");
        self.mass = next;
        self.radius = radius_of(next);
    }
}

/// Capability trait implemented by every entity kind.
pub trait Massed {
    /// Get the shared body data.
    fn body(&self) -> &Body;

    /// Get mutable body data.
    fn body_mut(&mut self) -> &mut Body;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_always_derived_from_mass() {
        let mut body = Body::new(Vec2::ZERO, 200.0, Color::default());
        assert!((body.radius() - 200.0f32.sqrt()).abs() < 1e-6);

        body.apply_mass_delta(25.0);
        assert_eq!(body.mass(), 225.0);
        assert!((body.radius() - 15.0).abs() < 1e-6);

        body.apply_mass_delta(-125.0);
        assert_eq!(body.mass(), 100.0);
        assert!((body.radius() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn conversions_are_inverse() {
        let mass = 200.0;
        assert!((mass_of(radius_of(mass)) - mass).abs() < 1e-4);
    }
}
