//! Game state and main loop.

use crate::config::Config;
use crate::input::{InputRegistry, TickCommand};
use crate::simulation;
use crate::snapshot;
use crate::world::{World, WorldBounds, WorldError};
use protocol::ConnectionId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_tungstenite::tungstenite::Utf8Bytes;
use tracing::{info, warn};

/// One serialized snapshot, fanned out identically to every connection.
/// The payload is reference-counted so fan-out never re-serializes.
#[derive(Debug, Clone)]
pub struct SnapshotBroadcast {
    pub tick: u64,
    pub json: Utf8Bytes,
}

/// Main game state: configuration plus the authoritative world.
///
/// Only two things ever take the write lock on this: join/leave from a
/// connection task, and the tick loop. Input flows through the lock-free
/// [`InputRegistry`] instead.
pub struct GameState {
    pub config: Config,
    pub world: World,
    next_connection_id: ConnectionId,
    /// Average tick duration in milliseconds (exponential moving average).
    pub update_time_avg: f64,
}

impl GameState {
    /// Create the game state and seed the initial food population.
    pub fn new(config: Config) -> Self {
        let bounds = WorldBounds {
            width: config.world.width,
            height: config.world.height,
        };
        let mut world = World::new(bounds);
        world.replenish_food(config.food.target_amount, config.food.mass);
        info!("World initialized: {} food", world.food.len());

        Self {
            config,
            world,
            next_connection_id: 1,
            update_time_avg: 0.0,
        }
    }

    /// Hand out the next connection identity.
    pub fn allocate_connection_id(&mut self) -> ConnectionId {
        let id = self.next_connection_id;
        self.next_connection_id += 1;
        id
    }

    /// Create a player for a connection when it joins.
    pub fn join(&mut self, id: ConnectionId, name: &str) -> Result<(), WorldError> {
        let name: String = name.chars().take(self.config.player.max_nick_length).collect();
        self.world.add_player(id, &name, self.config.player.start_mass)?;
        info!(
            connection = id,
            name = %self.world.players[&id].name,
            "player joined"
        );
        Ok(())
    }

    /// Remove a connection's player. Safe to call for connections that
    /// never joined.
    pub fn leave(&mut self, id: ConnectionId) {
        if self.world.remove_player(id) {
            info!(connection = id, "player removed");
        }
    }

    /// Run one tick against the committed world. On a tick fault the
    /// world is left exactly as it was and no snapshot is produced.
    pub fn tick(
        &mut self,
        commands: &HashMap<ConnectionId, TickCommand>,
    ) -> Option<SnapshotBroadcast> {
        match simulation::run_tick(&self.world, commands, &self.config) {
            Ok(next) => {
                self.world = next;
                let message = snapshot::build_state(&self.world);
                match message.encode() {
                    Ok(json) => Some(SnapshotBroadcast {
                        tick: self.world.tick,
                        json: json.into(),
                    }),
                    Err(err) => {
                        warn!(tick = self.world.tick, %err, "failed to encode snapshot");
                        None
                    }
                }
            }
            Err(err) => {
                warn!(tick = self.world.tick, %err, "tick fault, skipping tick");
                None
            }
        }
    }
}

/// Drive the fixed-rate tick loop and publish one snapshot per tick.
pub async fn run_game_loop(
    state: Arc<RwLock<GameState>>,
    inputs: Arc<InputRegistry>,
    snapshot_tx: broadcast::Sender<SnapshotBroadcast>,
    tick_interval_ms: u64,
) {
    let start = Instant::now() + Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(start, Duration::from_millis(tick_interval_ms));
    // Skip missed ticks instead of bursting to catch up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        // Hibernate while nobody is connected to reduce CPU usage.
        if snapshot_tx.receiver_count() == 0 {
            sleep(Duration::from_millis((tick_interval_ms * 4).max(100))).await;
            continue;
        }

        let commands = inputs.collect_commands();

        let snapshot = {
            let mut game = state.write().await;
            let tick_start = std::time::Instant::now();
            let snapshot = game.tick(&commands);
            let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

            game.update_time_avg = game.update_time_avg * 0.5 + tick_ms * 0.5;

            let tick_budget = tick_interval_ms as f64 * 0.9;
            if tick_ms > tick_budget {
                warn!(
                    "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} players, {} food",
                    game.world.tick,
                    tick_ms,
                    tick_budget,
                    game.world.players.len(),
                    game.world.food.len()
                );
            }

            snapshot
        }; // Write lock released here

        if let Some(snapshot) = snapshot {
            // Fan out before the next tick starts so every client sees
            // snapshots in the same tick order. A send error only means
            // every receiver disconnected in the meantime.
            let _ = snapshot_tx.send(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Massed;
    use crate::input::PlayerInput;

    #[test]
    fn duplicate_join_is_rejected() {
        let mut state = GameState::new(Config::default());
        let id = state.allocate_connection_id();
        state.join(id, "blob").unwrap();
        assert!(matches!(
            state.join(id, "imposter"),
            Err(WorldError::DuplicateConnection(_))
        ));
        assert_eq!(state.world.players[&id].name, "blob");
    }

    #[test]
    fn leave_is_idempotent() {
        let mut state = GameState::new(Config::default());
        let id = state.allocate_connection_id();
        state.join(id, "blob").unwrap();
        state.leave(id);
        state.leave(id);
        state.leave(999);
        assert!(state.world.players.is_empty());
    }

    #[test]
    fn long_names_are_truncated() {
        let mut state = GameState::new(Config::default());
        let id = state.allocate_connection_id();
        state.join(id, &"x".repeat(100)).unwrap();
        assert_eq!(state.world.players[&id].name.len(), 30);
    }

    #[test]
    fn tick_advances_and_produces_a_snapshot() {
        let mut state = GameState::new(Config::default());
        let id = state.allocate_connection_id();
        state.join(id, "blob").unwrap();

        let commands = HashMap::from([(
            id,
            TickCommand {
                input: PlayerInput {
                    angle: 0.0,
                    magnitude: 1.0,
                },
                donate: false,
            },
        )]);
        let snapshot = state.tick(&commands).expect("tick should succeed");
        assert_eq!(snapshot.tick, 1);
        assert_eq!(state.world.tick, 1);
        assert!(snapshot.json.as_str().contains(r#""type":"state""#));
    }

    #[test]
    fn faulted_tick_leaves_the_world_untouched() {
        let mut state = GameState::new(Config::default());
        let id = state.allocate_connection_id();
        state.join(id, "blob").unwrap();

        // Corrupt the committed world; the next tick must refuse to
        // commit anything on top of it.
        state
            .world
            .players
            .get_mut(&id)
            .unwrap()
            .primary_cell_mut()
            .body_mut()
            .position = glam::Vec2::new(f32::NAN, 0.0);
        let food_before = state.world.food.len();

        assert!(state.tick(&HashMap::new()).is_none());
        assert_eq!(state.world.tick, 0);
        assert_eq!(state.world.food.len(), food_before);
    }
}
