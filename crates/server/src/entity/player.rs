//! Player actor and its cells.

use super::body::{Body, Massed};
use crate::config::PlayerConfig;
use glam::Vec2;
use protocol::{Color, ConnectionId};

/// Most cells an actor can own at once (after splitting).
pub const MAX_PLAYER_CELLS: usize = 16;

/// Soft level cap: XP keeps accumulating but no level-up happens past it.
pub const LEVEL_CAP: u32 = 50;

/// XP required to leave `level`: `floor(100 * 1.15^(level-1))`, unreachable
/// at the cap.
///
/// The nudge before flooring keeps mathematically exact powers from
/// landing just below an integer (`100.0 * 1.15` is 114.999...9 in
/// binary, which would floor to 114 instead of 115).
pub fn level_threshold(level: u32) -> f64 {
    if level >= LEVEL_CAP {
        f64::INFINITY
    } else {
        (100.0 * 1.15f64.powi(level as i32 - 1) + 1e-6).floor()
    }
}

/// One physical circle owned by a player.
#[derive(Debug, Clone)]
pub struct Cell {
    body: Body,
}

impl Cell {
    pub fn new(position: Vec2, mass: f32, color: Color) -> Self {
        Self {
            body: Body::new(position, mass, color),
        }
    }
}

impl Massed for Cell {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

/// A connected participant: identity, progression, and 1..=16 owned cells.
/// Cells never outlive their player.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
    pub cells: Vec<Cell>,
    pub level: u32,
    pub xp: f64,
    /// Always `level_threshold(level)`, recomputed on every level change.
    pub xp_to_next: f64,
}

impl Player {
    /// Create a level-1 player with a single cell.
    pub fn new(id: ConnectionId, name: String, position: Vec2, mass: f32, color: Color) -> Self {
        Self {
            id,
            name,
            cells: vec![Cell::new(position, mass, color)],
            level: 1,
            xp: 0.0,
            xp_to_next: level_threshold(1),
        }
    }

    /// The cell driving the broadcast view. A player always owns at least
    /// one cell.
    pub fn primary_cell(&self) -> &Cell {
        &self.cells[0]
    }

    pub fn primary_cell_mut(&mut self) -> &mut Cell {
        &mut self.cells[0]
    }

    /// Movement speed for a cell of the given radius: base speed with a
    /// small linear level bonus, damped by a radius drag term.
    pub fn speed_for(level: u32, radius: f32, cfg: &PlayerConfig) -> f32 {
        let base = cfg.base_speed * (1.0 + level.saturating_sub(1) as f32 * cfg.level_speed_bonus);
        base / (1.0 + radius * cfg.radius_drag)
    }

    /// Grant XP and apply any level-ups, carrying remainder XP forward and
    /// recomputing the threshold at each step. Stops at the soft cap.
    pub fn gain_xp(&mut self, amount: f64) {
        self.xp += amount;
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.level += 1;
            self.xp_to_next = level_threshold(self.level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_curve_values() {
        assert_eq!(level_threshold(1), 100.0);
        // 100 * 1.15 is 114.999...9 in binary; it must still floor to 115.
        assert_eq!(level_threshold(2), 115.0);
        assert_eq!(level_threshold(3), 132.0);
        assert_eq!(level_threshold(5), 174.0);
        assert!(level_threshold(50).is_infinite());
        assert!(level_threshold(73).is_infinite());
    }

    #[test]
    fn xp_carries_over_on_level_up() {
        let mut player = Player::new(1, "blob".into(), Vec2::ZERO, 200.0, Color::default());
        player.gain_xp(150.0);
        assert_eq!(player.level, 2);
        assert_eq!(player.xp, 50.0);
        assert_eq!(player.xp_to_next, 115.0);
    }

    #[test]
    fn multiple_level_ups_in_one_grant() {
        let mut player = Player::new(1, "blob".into(), Vec2::ZERO, 200.0, Color::default());
        // 100 + 115 = 215 clears two levels exactly.
        player.gain_xp(215.0);
        assert_eq!(player.level, 3);
        assert_eq!(player.xp, 0.0);
        assert_eq!(player.xp_to_next, level_threshold(3));
    }

    #[test]
    fn xp_accumulates_past_the_cap() {
        let mut player = Player::new(1, "blob".into(), Vec2::ZERO, 200.0, Color::default());
        player.level = LEVEL_CAP;
        player.xp_to_next = level_threshold(LEVEL_CAP);
        player.gain_xp(1_000_000.0);
        assert_eq!(player.level, LEVEL_CAP);
        assert_eq!(player.xp, 1_000_000.0);
    }

    #[test]
    fn speed_shrinks_with_radius_and_grows_with_level() {
        let cfg = PlayerConfig::default();
        let small = Player::speed_for(1, 10.0, &cfg);
        let large = Player::speed_for(1, 100.0, &cfg);
        assert!(large < small);

        let leveled = Player::speed_for(10, 10.0, &cfg);
        assert!(leveled > small);

        // speed = 3.8 / (1 + sqrt(200) * 0.02) at level 1.
        let expected = 3.8 / (1.0 + 200.0f32.sqrt() * 0.02);
        assert!((Player::speed_for(1, 200.0f32.sqrt(), &cfg) - expected).abs() < 1e-6);
    }
}
