//! Client/server message definitions.
//!
//! Messages travel as JSON text frames. Inbound messages are small and
//! frequent (`Input` arrives at the client's own frame rate); the outbound
//! `State` snapshot is built once per tick and sent identically to every
//! connection.

use crate::{Color, ConnectionId, ProtocolError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Messages sent by clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join the arena under a display name.
    Join { name: String },
    /// Latest movement intent: angle in radians, magnitude in [0, 1].
    Input { angle: f32, magnitude: f32 },
    /// Donate a fixed chunk of mass along the current input angle.
    Donate,
}

impl ClientMessage {
    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Messages sent by the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join acknowledgement.
    Joined {
        id: ConnectionId,
        world_width: f32,
        world_height: f32,
    },
    /// Full world snapshot, broadcast once per tick.
    State {
        tick: u64,
        players: BTreeMap<ConnectionId, PlayerView>,
        food: Vec<FoodView>,
        ejected_masses: Vec<EjectedMassView>,
    },
    /// A request was rejected (e.g. joining twice).
    Error { message: String },
}

impl ServerMessage {
    /// Encode to a text frame payload.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Per-player snapshot data. Position and radius describe the player's
/// primary cell; level/xp feed the client HUD.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub id: ConnectionId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Color,
    pub name: String,
    pub level: u32,
    pub xp: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoodView {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize)]
pub struct EjectedMassView {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Color,
}
