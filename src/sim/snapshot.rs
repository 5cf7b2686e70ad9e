/// Render handoff: the one structure the presentation layer reads.
/// Entity internals (velocities, patrol state, input flags) stay in
/// the sim; the renderer gets boxes, kinds, and the camera offset.

use crate::domain::entity::Facing;
use crate::domain::grid::Aabb;
use crate::sim::world::WorldState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpriteKind {
    Player,
    Enemy,
}

#[derive(Clone, Copy, Debug)]
pub struct Sprite {
    pub id: usize,
    pub aabb: Aabb,
    pub kind: SpriteKind,
    pub facing: Facing,
}

pub struct RenderSnapshot {
    pub sprites: Vec<Sprite>,
    pub camera_x: f32,
}

/// Build the per-frame snapshot. The player is always listed (the
/// death animation still draws it); dead enemies are not.
pub fn capture(world: &WorldState) -> RenderSnapshot {
    let mut sprites = Vec::with_capacity(1 + world.enemies.len());

    sprites.push(Sprite {
        id: 0,
        aabb: world.player.body.aabb(),
        kind: SpriteKind::Player,
        facing: world.player.facing,
    });
    for enemy in &world.enemies {
        if enemy.alive {
            sprites.push(Sprite {
                id: enemy.id + 1,
                aabb: enemy.body.aabb(),
                kind: SpriteKind::Enemy,
                facing: enemy.facing(),
            });
        }
    }

    RenderSnapshot {
        sprites,
        camera_x: world.camera.offset_x,
    }
}
