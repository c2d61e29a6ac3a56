//! Microcosmo game server library.

pub mod config;
pub mod entity;
pub mod input;
pub mod server;
pub mod simulation;
pub mod snapshot;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use server::{GameState, SnapshotBroadcast, run, run_game_loop};
