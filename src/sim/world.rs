/// WorldState: the complete snapshot of a running session.
///
/// Ownership is explicit: the world exclusively owns its TileGrid,
/// entities, and camera; no globals. A restart discards and rebuilds
/// them from the stored seed, so reset needs no coordination.
///
/// ## Camera
///
/// World pixels and screen cells are separate spaces. The camera holds
/// a horizontal pixel offset into the level; the renderer sets the
/// viewport width each frame from the terminal size and maps
/// `screen_x = world_x - offset_x`. Follow is a hard center clamp:
/// no dead zone, no smoothing. Levels narrower than the viewport
/// never scroll.

use crate::domain::entity::{Enemy, Player};
use crate::domain::grid::{Aabb, InvalidLevel, TileGrid};
use crate::domain::physics::PhysicsParams;
use crate::sim::gen;

/// Session-level state machine. The physics core never sees these.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    Dying,
    LevelComplete,
    GameOver,
    GameComplete,
}

#[derive(Clone, Debug)]
pub struct Camera {
    /// Horizontal scroll into the level, pixels.
    pub offset_x: f32,
    /// Visible width in pixels; set by the renderer each frame.
    pub viewport_w: f32,
    level_w: f32,
}

impl Camera {
    pub fn new() -> Self {
        Camera {
            offset_x: 0.0,
            viewport_w: 0.0,
            level_w: 0.0,
        }
    }

    pub fn set_level_width(&mut self, level_w: f32) {
        self.level_w = level_w;
        self.offset_x = 0.0;
    }

    /// Center on the target, clamped to the level bounds.
    /// Invariant after every call:
    /// `0 <= offset_x <= max(0, level_w - viewport_w)`.
    pub fn update(&mut self, target: &Aabb) {
        if self.viewport_w <= 0.0 {
            return;
        }
        let max_offset = (self.level_w - self.viewport_w).max(0.0);
        self.offset_x = (target.center_x() - self.viewport_w / 2.0).clamp(0.0, max_offset);
    }
}

pub struct WorldState {
    // ── Level ──
    pub grid: TileGrid,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub camera: Camera,

    // ── Tuning ──
    pub physics: PhysicsParams,
    pub tile_size: f32,

    // ── Meta ──
    pub phase: Phase,
    pub score: u32,
    pub lives: u32,
    pub level: u32,
    pub level_count: u32,
    pub seed: u64,
    pub tick: u64,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
    pub paused: bool,
}

impl WorldState {
    pub fn new(physics: PhysicsParams, tile_size: f32, level_count: u32, seed: u64) -> Self {
        WorldState {
            grid: TileGrid::empty(tile_size),
            player: Player::spawn(0, 0, tile_size),
            enemies: vec![],
            camera: Camera::new(),
            physics,
            tile_size,
            phase: Phase::Title,
            score: 0,
            lives: 5,
            level: 0,
            level_count,
            seed,
            tick: 0,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
            paused: false,
        }
    }

    /// Regenerate and enter a level. Preserves score and lives. The
    /// generator is deterministic, so the same (seed, level) always
    /// rebuilds the same layout.
    pub fn load_level(&mut self, level: u32) -> Result<(), InvalidLevel> {
        let parsed = gen::generate_parsed(self.seed, level, self.tile_size)?;

        self.level = level;
        self.player = Player::spawn(parsed.player_spawn.0, parsed.player_spawn.1, self.tile_size);
        self.enemies = parsed
            .enemy_spawns
            .iter()
            .enumerate()
            .map(|(id, &(col, row))| Enemy::spawn(id, col, row, &parsed.grid))
            .collect();
        self.grid = parsed.grid;
        self.camera.set_level_width(self.grid.width_px());
        self.camera.update(&self.player.body.aabb());
        self.tick = 0;
        self.anim_tick = 0;
        self.phase = Phase::Playing;
        self.set_message(&format!("World {}", level + 1), 90);
        Ok(())
    }

    /// Restart the current level: same seed, identical layout.
    pub fn restart_level(&mut self) -> Result<(), InvalidLevel> {
        self.load_level(self.level)
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(level_w: f32, viewport_w: f32) -> Camera {
        let mut c = Camera::new();
        c.set_level_width(level_w);
        c.viewport_w = viewport_w;
        c
    }

    fn target_at(center_x: f32) -> Aabb {
        Aabb::new(center_x - 8.0, 0.0, 16.0, 16.0)
    }

    #[test]
    fn camera_centers_on_target() {
        let mut c = camera(2000.0, 800.0);
        c.update(&target_at(1000.0));
        assert_eq!(c.offset_x, 600.0);
    }

    #[test]
    fn camera_clamps_at_level_edges() {
        let mut c = camera(2000.0, 800.0);
        c.update(&target_at(10.0));
        assert_eq!(c.offset_x, 0.0);
        c.update(&target_at(1990.0));
        assert_eq!(c.offset_x, 1200.0);
    }

    #[test]
    fn camera_invariant_holds_across_sweep() {
        let mut c = camera(2000.0, 800.0);
        let max = 2000.0 - 800.0;
        for i in -50..250 {
            c.update(&target_at(i as f32 * 10.0));
            assert!(c.offset_x >= 0.0);
            assert!(c.offset_x <= max);
        }
    }

    #[test]
    fn narrow_level_never_scrolls() {
        let mut c = camera(400.0, 800.0);
        c.update(&target_at(390.0));
        assert_eq!(c.offset_x, 0.0);
        c.update(&target_at(0.0));
        assert_eq!(c.offset_x, 0.0);
    }

    #[test]
    fn load_level_spawns_from_markers() {
        let mut w = WorldState::new(PhysicsParams::default(), 40.0, 32, 42);
        w.load_level(0).unwrap();
        assert_eq!(w.phase, Phase::Playing);
        assert!(!w.enemies.is_empty());
        assert!(w.player.alive);
        assert_eq!(w.grid.width(), gen::GRID_COLS);
    }

    #[test]
    fn restart_rebuilds_identical_layout() {
        let mut w = WorldState::new(PhysicsParams::default(), 40.0, 32, 42);
        w.load_level(3).unwrap();
        let tiles_before: Vec<_> = (0..w.grid.width() as i32)
            .map(|c| w.grid.tile_at(c, gen::GRID_ROWS as i32 - 1))
            .collect();
        let enemy_count = w.enemies.len();
        w.restart_level().unwrap();
        let tiles_after: Vec<_> = (0..w.grid.width() as i32)
            .map(|c| w.grid.tile_at(c, gen::GRID_ROWS as i32 - 1))
            .collect();
        assert_eq!(tiles_before, tiles_after);
        assert_eq!(w.enemies.len(), enemy_count);
    }
}
