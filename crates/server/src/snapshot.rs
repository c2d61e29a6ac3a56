//! Broadcast snapshot construction.
//!
//! Once per tick the committed world state is flattened into one `State`
//! message. Every connection receives the identical payload; there is no
//! per-client view culling.

use crate::entity::Massed;
use crate::world::World;
use protocol::{EjectedMassView, FoodView, PlayerView, ServerMessage};
use std::collections::BTreeMap;

/// Build the per-tick broadcast message.
pub fn build_state(world: &World) -> ServerMessage {
    let players: BTreeMap<_, _> = world
        .players
        .values()
        .map(|player| {
            let body = player.primary_cell().body();
            (
                player.id,
                PlayerView {
                    id: player.id,
                    x: body.position.x,
                    y: body.position.y,
                    radius: body.radius(),
                    color: body.color,
                    name: player.name.clone(),
                    level: player.level,
                    xp: player.xp,
                },
            )
        })
        .collect();

    let food = world
        .food
        .iter()
        .map(|pellet| {
            let body = pellet.body();
            FoodView {
                x: body.position.x,
                y: body.position.y,
                radius: body.radius(),
                color: body.color,
            }
        })
        .collect();

    let ejected_masses = world
        .ejected
        .iter()
        .map(|chunk| {
            let body = chunk.body();
            EjectedMassView {
                x: body.position.x,
                y: body.position.y,
                radius: body.radius(),
                color: body.color,
            }
        })
        .collect();

    ServerMessage::State {
        tick: world.tick,
        players,
        food,
        ejected_masses,
    }
}
