/// Entities: Player and Enemy. Each composes a KinematicBody with its
/// policy: the player reads input intents, the enemy runs a two-state
/// patrol. Neither touches the grid outside the shared resolver, except
/// the patrol-bound derivation at spawn.

use super::body::KinematicBody;
use super::grid::TileGrid;
use super::physics::PhysicsParams;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Per-frame input snapshot: held state only. Edge detection for the
/// jump lives in the player ("was not pressed last frame, is pressed
/// this frame"); there is no event queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub body: KinematicBody,
    pub facing: Facing,
    pub alive: bool,
    /// Jump intent seen last frame; a fresh press requires a false→true
    /// transition, so holding the key never re-fires.
    jump_held: bool,
}

impl Player {
    /// Spawn at a grid cell; the body fills one tile.
    pub fn spawn(col: usize, row: usize, tile_size: f32) -> Self {
        Player {
            body: KinematicBody::new(
                col as f32 * tile_size,
                row as f32 * tile_size,
                tile_size,
                tile_size,
            ),
            facing: Facing::Right,
            alive: true,
            jump_held: false,
        }
    }

    /// Turn this frame's input into body intent. Horizontal velocity is
    /// set directly (no inertia). Returns true if a jump fired.
    pub fn apply_input(&mut self, input: &FrameInput, params: &PhysicsParams) -> bool {
        let dir = (input.right as i8 - input.left as i8) as f32;
        self.body.vx = dir * params.move_speed;
        if dir < 0.0 {
            self.facing = Facing::Left;
        } else if dir > 0.0 {
            self.facing = Facing::Right;
        }

        let jumped = input.jump && !self.jump_held && self.body.on_ground;
        if jumped {
            self.body.vy = params.jump_velocity;
            self.body.on_ground = false;
        }
        self.jump_held = input.jump;
        jumped
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: usize,
    pub body: KinematicBody,
    /// Patrol direction, -1.0 or +1.0.
    pub dir: f32,
    /// Pixel interval the enemy may occupy, derived from the contiguous
    /// floored span beneath its spawn tile.
    pub patrol_min: f32,
    pub patrol_max: f32,
    pub alive: bool,
}

impl Enemy {
    pub fn spawn(id: usize, col: usize, row: usize, grid: &TileGrid) -> Self {
        let ts = grid.tile_size();
        let (patrol_min, patrol_max) = patrol_span(grid, col as i32, row as i32);
        Enemy {
            id,
            body: KinematicBody::new(col as f32 * ts, row as f32 * ts, ts, ts),
            dir: -1.0,
            patrol_min,
            patrol_max,
            alive: true,
        }
    }

    /// Choose this frame's horizontal intent. Flips before a step that
    /// would leave the patrol bounds.
    pub fn think(&mut self, params: &PhysicsParams) {
        let next = self.body.x + self.dir * params.enemy_speed;
        if next < self.patrol_min || next + self.body.w > self.patrol_max {
            self.dir = -self.dir;
        }
        self.body.vx = self.dir * params.enemy_speed;
    }

    /// Called after resolution when the step clamped against a wall.
    pub fn hit_wall(&mut self) {
        self.dir = -self.dir;
    }

    pub fn facing(&self) -> Facing {
        if self.dir < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        }
    }
}

/// The contiguous run of cells around (col, row) that are passable with
/// solid ground directly below, in pixels. Out-of-range probes read as
/// open air, so the span always stops at the level edge.
fn patrol_span(grid: &TileGrid, col: i32, row: i32) -> (f32, f32) {
    let below = row + 1;
    let mut lo = col;
    while grid.tile_at(lo - 1, below).is_solid() && grid.tile_at(lo - 1, row).is_passable() {
        lo -= 1;
    }
    let mut hi = col;
    while grid.tile_at(hi + 1, below).is_solid() && grid.tile_at(hi + 1, row).is_passable() {
        hi += 1;
    }
    let ts = grid.tile_size();
    (lo as f32 * ts, (hi + 1) as f32 * ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::physics::{step_body, PhysicsParams};

    const TS: f32 = 16.0;

    fn grid_from(rows: &[&str]) -> TileGrid {
        let rows: Vec<String> = rows.iter().map(|s| s.to_string()).collect();
        TileGrid::from_rows(&rows, TS).unwrap().grid
    }

    fn params() -> PhysicsParams {
        PhysicsParams {
            gravity: 0.5,
            max_fall_speed: 16.0,
            move_speed: 5.0,
            jump_velocity: -12.0,
            enemy_speed: 1.5,
        }
    }

    #[test]
    fn held_jump_fires_exactly_once() {
        let g = grid_from(&[
            "P....",
            ".....",
            "XXXXX",
        ]);
        let mut p = Player::spawn(0, 1, TS);
        p.body.on_ground = true;

        let input = FrameInput { left: false, right: false, jump: true };
        let mut impulses = 0;
        for _ in 0..30 {
            if p.apply_input(&input, &params()) {
                impulses += 1;
            }
            step_body(&mut p.body, &g, &params());
        }
        // One impulse on the first frame; the held key never re-fires,
        // even after landing again.
        assert_eq!(impulses, 1);
    }

    #[test]
    fn jump_requires_ground() {
        let mut p = Player::spawn(0, 0, TS);
        p.body.on_ground = false;
        let input = FrameInput { jump: true, ..Default::default() };
        assert!(!p.apply_input(&input, &params()));
        assert_eq!(p.body.vy, 0.0);
    }

    #[test]
    fn release_and_repress_fires_again() {
        let g = grid_from(&[
            "P....",
            ".....",
            "XXXXX",
        ]);
        let mut p = Player::spawn(0, 1, TS);
        p.body.on_ground = true;

        let held = FrameInput { jump: true, ..Default::default() };
        let idle = FrameInput::default();

        assert!(p.apply_input(&held, &params()));
        // Settle back onto the floor
        for _ in 0..60 {
            p.apply_input(&idle, &params());
            step_body(&mut p.body, &g, &params());
        }
        assert!(p.body.on_ground);
        assert!(p.apply_input(&held, &params()));
    }

    #[test]
    fn input_sets_velocity_and_facing() {
        let mut p = Player::spawn(0, 0, TS);
        let left = FrameInput { left: true, ..Default::default() };
        p.apply_input(&left, &params());
        assert_eq!(p.body.vx, -5.0);
        assert_eq!(p.facing, Facing::Left);

        p.apply_input(&FrameInput::default(), &params());
        assert_eq!(p.body.vx, 0.0);
        // Facing persists while standing still
        assert_eq!(p.facing, Facing::Left);
    }

    #[test]
    fn patrol_span_stops_at_gap_and_wall() {
        let g = grid_from(&[
            "P........",
            "...X.E...",
            "..XXXXX.X",
        ]);
        let e = Enemy::spawn(0, 5, 1, &g);
        // Floored, passable run is cols 4..=6: col 3 is walled, col 7
        // has no floor beneath.
        assert_eq!(e.patrol_min, 4.0 * TS);
        assert_eq!(e.patrol_max, 7.0 * TS);
    }

    #[test]
    fn enemy_stays_inside_patrol_bounds() {
        let g = grid_from(&[
            "P........",
            ".....E...",
            "..XXXXX..",
        ]);
        let mut e = Enemy::spawn(0, 5, 1, &g);
        for _ in 0..600 {
            e.think(&params());
            step_body(&mut e.body, &g, &params());
            assert!(e.body.x >= e.patrol_min - 0.01);
            assert!(e.body.x + e.body.w <= e.patrol_max + 0.01);
        }
    }

    #[test]
    fn wall_contact_flips_direction() {
        let mut e = Enemy {
            id: 0,
            body: KinematicBody::new(0.0, 0.0, TS, TS),
            dir: 1.0,
            patrol_min: 0.0,
            patrol_max: 100.0,
            alive: true,
        };
        e.hit_wall();
        assert_eq!(e.dir, -1.0);
        assert_eq!(e.facing(), Facing::Left);
    }
}
