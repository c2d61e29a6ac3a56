//! Ejected mass entity.

use super::body::{Body, Massed};
use glam::Vec2;
use protocol::Color;

/// A chunk of mass donated by a player. It drifts along a decaying
/// velocity until it settles or is consumed.
#[derive(Debug, Clone)]
pub struct EjectedMass {
    body: Body,
    /// Current velocity, decayed every tick.
    pub velocity: Vec2,
}

impl EjectedMass {
    /// Create a new chunk (usually colored like the donating player).
    pub fn new(position: Vec2, velocity: Vec2, mass: f32, color: Color) -> Self {
        Self {
            body: Body::new(position, mass, color),
            velocity,
        }
    }

    /// Advance one tick of drift: displace by the current velocity, then
    /// decay it.
    pub fn integrate(&mut self, decay: f32) {
        self.body.position += self.velocity;
        self.velocity *= decay;
    }

    /// Whether the chunk has slowed below the despawn threshold.
    pub fn is_settled(&self, min_speed: f32) -> bool {
        self.velocity.length() < min_speed
    }
}

impl Massed for EjectedMass {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_decays_until_settled() {
        let mut chunk = EjectedMass::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 40.0, Color::default());

        chunk.integrate(0.95);
        assert_eq!(chunk.body().position, Vec2::new(10.0, 0.0));
        assert!((chunk.velocity.x - 9.5).abs() < 1e-6);

        for _ in 0..200 {
            chunk.integrate(0.95);
        }
        assert!(chunk.is_settled(0.05));
    }
}
