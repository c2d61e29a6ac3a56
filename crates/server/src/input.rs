//! Per-connection input ingestion.
//!
//! Each connection owns one slot holding only its most recent movement
//! intent: bursts of client messages overwrite each other and never queue,
//! so the client's message rate cannot distort tick timing. Slots live in
//! a sharded concurrent map; a write touches only that connection's entry,
//! never a global lock.

use dashmap::DashMap;
use protocol::ConnectionId;
use std::collections::HashMap;
use tracing::debug;

/// A movement intent: angle in radians, magnitude in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerInput {
    pub angle: f32,
    pub magnitude: f32,
}

impl PlayerInput {
    /// No movement.
    pub const IDLE: Self = Self {
        angle: 0.0,
        magnitude: 0.0,
    };
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self::IDLE
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct InputSlot {
    input: PlayerInput,
    /// One-shot donation request, cleared when the tick collects it.
    donate: bool,
}

/// Everything the tick engine needs from one connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickCommand {
    pub input: PlayerInput,
    pub donate: bool,
}

/// Last-value-wins input cache, shared between the connection tasks
/// (writers) and the tick loop (reader).
#[derive(Debug, Default)]
pub struct InputRegistry {
    slots: DashMap<ConnectionId, InputSlot>,
}

impl InputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection's latest intent, replacing any unconsumed one.
    /// Non-finite values reset the slot to idle instead of faulting the
    /// tick; magnitude is clamped to [0, 1].
    pub fn record(&self, id: ConnectionId, angle: f32, magnitude: f32) {
        let input = if angle.is_finite() && magnitude.is_finite() {
            PlayerInput {
                angle,
                magnitude: magnitude.clamp(0.0, 1.0),
            }
        } else {
            debug!(connection = id, "discarding non-finite input");
            PlayerInput::IDLE
        };
        self.slots.entry(id).or_default().input = input;
    }

    /// Flag a one-shot donation for the next tick.
    pub fn request_donate(&self, id: ConnectionId) {
        self.slots.entry(id).or_default().donate = true;
    }

    /// Collect every connection's current command for one tick. Movement
    /// intents persist across ticks; one-shot flags are cleared.
    pub fn collect_commands(&self) -> HashMap<ConnectionId, TickCommand> {
        let mut commands = HashMap::with_capacity(self.slots.len());
        for mut entry in self.slots.iter_mut() {
            let donate = std::mem::take(&mut entry.donate);
            commands.insert(
                *entry.key(),
                TickCommand {
                    input: entry.input,
                    donate,
                },
            );
        }
        commands
    }

    /// Drop a connection's slot on disconnect.
    pub fn remove(&self, id: ConnectionId) {
        self.slots.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_value_wins() {
        let registry = InputRegistry::new();
        registry.record(1, 0.5, 1.0);
        registry.record(1, 2.0, 0.25);

        let commands = registry.collect_commands();
        let input = commands[&1].input;
        assert_eq!(input.angle, 2.0);
        assert_eq!(input.magnitude, 0.25);
    }

    #[test]
    fn non_finite_input_reverts_to_idle() {
        let registry = InputRegistry::new();
        registry.record(1, 1.0, 1.0);
        registry.record(1, f32::NAN, 1.0);
        assert_eq!(registry.collect_commands()[&1].input, PlayerInput::IDLE);

        registry.record(1, 0.0, f32::INFINITY);
        assert_eq!(registry.collect_commands()[&1].input, PlayerInput::IDLE);
    }

    #[test]
    fn magnitude_is_clamped() {
        let registry = InputRegistry::new();
        registry.record(1, 0.0, 7.0);
        assert_eq!(registry.collect_commands()[&1].input.magnitude, 1.0);

        registry.record(1, 0.0, -3.0);
        assert_eq!(registry.collect_commands()[&1].input.magnitude, 0.0);
    }

    #[test]
    fn donate_flag_is_one_shot() {
        let registry = InputRegistry::new();
        registry.record(1, 1.0, 0.5);
        registry.request_donate(1);

        let first = registry.collect_commands();
        assert!(first[&1].donate);

        let second = registry.collect_commands();
        assert!(!second[&1].donate);
        // The movement intent itself persists.
        assert_eq!(second[&1].input.magnitude, 0.5);
    }

    #[test]
    fn removed_connections_disappear() {
        let registry = InputRegistry::new();
        registry.record(1, 1.0, 1.0);
        registry.remove(1);
        assert!(registry.collect_commands().is_empty());
    }
}
