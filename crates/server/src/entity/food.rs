//! Food pellet entity.

use super::body::{Body, Massed};
use glam::Vec2;
use protocol::Color;

/// A static pellet that exists until a player consumes it.
#[derive(Debug, Clone)]
pub struct Food {
    body: Body,
}

impl Food {
    /// Create a new pellet.
    pub fn new(position: Vec2, mass: f32, color: Color) -> Self {
        Self {
            body: Body::new(position, mass, color),
        }
    }
}

impl Massed for Food {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}
