/// Axis-separated collision resolution, the single source of truth.
///
/// ## Resolution order
///
/// Per frame, for one body:
///   1. HORIZONTAL: integrate `x += vx`, clamp against every solid
///      tile the moved AABB overlaps (vx > 0: right edge to tile left,
///      vx < 0: left edge to tile right).
///   2. VERTICAL: apply gravity (capped at `max_fall_speed`),
///      integrate `y += vy`, reset `on_ground`, then snap: falling
///      lands on tile tops (`on_ground = true`), rising bumps tile
///      bottoms. Either snap zeroes `vy`.
///
/// X resolves fully before Y begins. Resolving both axes at once is
/// where the corner jitter/tunneling bugs live.
///
/// ## Broad phase
///
/// Only the grid cells spanned by the tentative AABB are probed
/// (divide the box bounds by `tile_size`). `tile_at` treats
/// out-of-range cells as open air, so the span needs no clamping.
///
/// ## Degenerate overlap
///
/// A body overlapping several tiles on one axis resolves against the
/// nearest edge: the clamps fold with min/max, so the most restrictive
/// tile wins and the step never fails.
///
/// No continuous collision detection. Tunneling through one-tile-thick
/// geometry is impossible as long as per-frame displacement stays
/// under `tile_size`; config loading caps the speeds accordingly.

use super::body::KinematicBody;
use super::grid::{Aabb, TileGrid};

/// Motion tuning, in per-frame pixel units (fixed 60 Hz step).
#[derive(Clone, Copy, Debug)]
pub struct PhysicsParams {
    /// Downward acceleration added to `vy` each frame.
    pub gravity: f32,
    /// Cap on downward `vy`.
    pub max_fall_speed: f32,
    /// Player horizontal speed while an arrow is held.
    pub move_speed: f32,
    /// Initial `vy` on jump (negative = up).
    pub jump_velocity: f32,
    /// Enemy patrol speed.
    pub enemy_speed: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        PhysicsParams {
            gravity: 0.5,
            max_fall_speed: 20.0,
            move_speed: 5.0,
            jump_velocity: -12.0,
            enemy_speed: 1.5,
        }
    }
}

/// What the resolver ran into this frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepResult {
    /// Clamped against a solid tile while moving horizontally.
    pub hit_wall: bool,
    /// Bumped a tile bottom while rising.
    pub hit_ceiling: bool,
    /// Transitioned onto a supporting tile this frame.
    pub landed: bool,
}

/// Advance one body by one frame against the grid.
pub fn step_body(body: &mut KinematicBody, grid: &TileGrid, params: &PhysicsParams) -> StepResult {
    let was_airborne = !body.on_ground;

    let hit_wall = resolve_horizontal(body, grid);

    body.vy = (body.vy + params.gravity).min(params.max_fall_speed);
    body.y += body.vy;
    body.on_ground = false;
    let hit_ceiling = resolve_vertical(body, grid);

    StepResult {
        hit_wall,
        hit_ceiling,
        landed: was_airborne && body.on_ground,
    }
}

// ══════════════════════════════════════════════════════════════
// Per-axis resolution
// ══════════════════════════════════════════════════════════════

/// Integrate and resolve the X axis. Returns true if clamped.
fn resolve_horizontal(body: &mut KinematicBody, grid: &TileGrid) -> bool {
    body.x += body.vx;
    if body.vx == 0.0 {
        return false;
    }

    let moved = body.aabb();
    let mut hit = false;
    for_each_solid_overlap(grid, &moved, |tile| {
        if body.vx > 0.0 {
            body.x = body.x.min(tile.x - body.w);
        } else {
            body.x = body.x.max(tile.right());
        }
        hit = true;
    });
    hit
}

/// Resolve the Y axis after integration. Returns true on ceiling bump;
/// sets `on_ground` on landing. Either contact zeroes `vy`.
fn resolve_vertical(body: &mut KinematicBody, grid: &TileGrid) -> bool {
    let moved = body.aabb();
    let falling = body.vy > 0.0;
    let rising = body.vy < 0.0;
    let mut landed = false;
    let mut bumped = false;

    for_each_solid_overlap(grid, &moved, |tile| {
        if falling {
            body.y = body.y.min(tile.y - body.h);
            landed = true;
        } else if rising {
            body.y = body.y.max(tile.bottom());
            bumped = true;
        }
    });

    if landed {
        body.vy = 0.0;
        body.on_ground = true;
    }
    if bumped {
        body.vy = 0.0;
    }
    bumped
}

/// Broad phase + narrow phase: visit the pixel bounds of every solid
/// tile the box actually overlaps.
fn for_each_solid_overlap<F: FnMut(&Aabb)>(grid: &TileGrid, b: &Aabb, mut f: F) {
    let ts = grid.tile_size();
    let col0 = (b.x / ts).floor() as i32;
    let col1 = (b.right() / ts).floor() as i32;
    let row0 = (b.y / ts).floor() as i32;
    let row1 = (b.bottom() / ts).floor() as i32;

    for row in row0..=row1 {
        for col in col0..=col1 {
            if !grid.tile_at(col, row).is_solid() {
                continue;
            }
            let tile = grid.tile_aabb(col, row);
            if b.intersects(&tile) {
                f(&tile);
            }
        }
    }
}

/// Does the body's AABB overlap any solid tile? (test/debug invariant)
pub fn overlaps_solid(body: &KinematicBody, grid: &TileGrid) -> bool {
    let mut any = false;
    for_each_solid_overlap(grid, &body.aabb(), |_| any = true);
    any
}
