//! Game entities.
//!
//! This module defines all entity kinds in the simulation. Each kind
//! composes a [`Body`] (the shared position/mass/radius/color capability)
//! rather than inheriting from a base type.

mod body;
mod ejected_mass;
mod food;
mod player;

pub use body::{Body, Massed, mass_of, radius_of};
pub use ejected_mass::EjectedMass;
pub use food::Food;
pub use player::{Cell, LEVEL_CAP, MAX_PLAYER_CELLS, Player, level_threshold};
