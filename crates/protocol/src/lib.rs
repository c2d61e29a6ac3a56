//! Shared protocol crate for the Microcosmo game server.
//!
//! This crate contains:
//! - Client/server message definitions (JSON over WebSocket text frames)
//! - Shared types (Color, ConnectionId)
//! - Protocol error types

mod error;
mod messages;

pub use error::ProtocolError;
pub use messages::{ClientMessage, EjectedMassView, FoodView, PlayerView, ServerMessage};

/// Identity of a connected client. Allocated monotonically by the server;
/// the same value keys the player in every `State` broadcast.
pub type ConnectionId = u32;

/// RGB color used for entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from an HSL triple. The game picks entity colors by
    /// random hue with fixed saturation/lightness per entity kind
    /// (food: 90%/70%, players: 100%/50%).
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(360.0);
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        Self::new(
            ((r + m) * 255.0).round() as u8,
            ((g + m) * 255.0).round() as u8,
            ((b + m) * 255.0).round() as u8,
        )
    }
}
