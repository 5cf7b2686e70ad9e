/// The step function: advances the world by one fixed 60 Hz tick.
///
/// Processing order:
///   1. Player intent (input → velocity, edge-triggered jump)
///   2. Enemy intent (patrol AI)
///   3. Collision resolution, every entity against the grid
///   4. Entity contacts (stomp / side hit)
///   5. Camera follow
///   6. Outcome check (fell off the world / cleared the level)
///
/// No sub-stepping and no time compensation: a host that cannot hold
/// 60 Hz simply runs slower.

use crate::domain::entity::FrameInput;
use crate::domain::physics;
use crate::sim::event::GameEvent;
use crate::sim::world::{Phase, WorldState};

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if world.phase != Phase::Playing {
        return vec![];
    }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 {
            world.message.clear();
        }
    }

    resolve_player_intent(world, &input, &mut events);
    resolve_enemy_intent(world);
    resolve_movement(world, &mut events);
    resolve_contacts(world, &mut events);
    world.camera.update(&world.player.body.aabb());
    resolve_outcome(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Intents
// ══════════════════════════════════════════════════════════════

fn resolve_player_intent(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    if !world.player.alive {
        return;
    }
    if world.player.apply_input(input, &world.physics) {
        events.push(GameEvent::PlayerJumped);
    }
}

fn resolve_enemy_intent(world: &mut WorldState) {
    for enemy in world.enemies.iter_mut() {
        if enemy.alive {
            enemy.think(&world.physics);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Movement: the shared resolver, one entity at a time
// ══════════════════════════════════════════════════════════════

fn resolve_movement(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.alive {
        let result = physics::step_body(&mut world.player.body, &world.grid, &world.physics);
        if result.landed {
            events.push(GameEvent::PlayerLanded);
        }
        // Post-condition of a resolved step
        debug_assert!(!physics::overlaps_solid(&world.player.body, &world.grid));
    }

    for enemy in world.enemies.iter_mut() {
        if !enemy.alive {
            continue;
        }
        let result = physics::step_body(&mut enemy.body, &world.grid, &world.physics);
        if result.hit_wall {
            enemy.hit_wall();
        }
        debug_assert!(!physics::overlaps_solid(&enemy.body, &world.grid));
    }
}

// ══════════════════════════════════════════════════════════════
// Contacts
// ══════════════════════════════════════════════════════════════

fn resolve_contacts(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.player.alive {
        return;
    }

    let player_box = world.player.body.aabb();
    let falling = world.player.body.vy > 0.0;
    let mut died = false;

    for enemy in world.enemies.iter_mut() {
        if !enemy.alive || !player_box.intersects(&enemy.body.aabb()) {
            continue;
        }
        if falling {
            // Stomp: enemy dies, player bounces with half a jump impulse
            enemy.alive = false;
            world.score += 100;
            events.push(GameEvent::EnemyStomped { id: enemy.id });
            world.player.body.vy = world.physics.jump_velocity * 0.5;
            world.player.body.on_ground = false;
        } else {
            died = true;
            break;
        }
    }

    if died {
        events.push(GameEvent::PlayerDied);
        player_die(world);
        return;
    }

    let floor = world.grid.height_px();
    world.enemies.retain(|e| e.alive && e.body.y < floor + e.body.h);
}

// ══════════════════════════════════════════════════════════════
// Outcome
// ══════════════════════════════════════════════════════════════

fn resolve_outcome(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.player.alive {
        return;
    }

    // Past the bottom edge: open air all the way down, read as death
    if world.player.body.y > world.grid.height_px() {
        events.push(GameEvent::PlayerDied);
        player_die(world);
        return;
    }

    // Past the right edge: level cleared
    if world.player.body.right() > world.grid.width_px() {
        world.score += 400;
        world.phase = Phase::LevelComplete;
        world.anim_tick = 0;
        events.push(GameEvent::LevelCleared);
        world.set_message(&format!("World {} Complete! +400", world.level + 1), 90);
    }
}

fn player_die(world: &mut WorldState) {
    world.player.alive = false;
    world.phase = Phase::Dying;
    world.anim_tick = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::body::KinematicBody;
    use crate::domain::entity::{Enemy, Player};
    use crate::domain::grid::TileGrid;
    use crate::domain::physics::{overlaps_solid, PhysicsParams};

    const TS: f32 = 16.0;

    fn world_from(rows: &[&str], params: PhysicsParams) -> WorldState {
        let rows: Vec<String> = rows.iter().map(|s| s.to_string()).collect();
        let parsed = TileGrid::from_rows(&rows, TS).unwrap();
        let mut w = WorldState::new(params, TS, 32, 0);
        w.player = Player::spawn(parsed.player_spawn.0, parsed.player_spawn.1, TS);
        w.enemies = parsed
            .enemy_spawns
            .iter()
            .enumerate()
            .map(|(id, &(col, row))| Enemy::spawn(id, col, row, &parsed.grid))
            .collect();
        w.camera.set_level_width(parsed.grid.width_px());
        w.grid = parsed.grid;
        w.phase = Phase::Playing;
        w
    }

    fn scenario_params() -> PhysicsParams {
        PhysicsParams {
            gravity: 0.6,
            max_fall_speed: 16.0,
            move_speed: 3.0,
            jump_velocity: -10.0,
            enemy_speed: 0.0,
        }
    }

    const RIGHT: FrameInput = FrameInput { left: false, right: true, jump: false };
    const IDLE: FrameInput = FrameInput { left: false, right: false, jump: false };

    #[test]
    fn gap_jump_scenario_clears_without_overlap() {
        // Floor with a two-tile gap at columns 4-5; run right at
        // 3 px/frame, jump once at the lip, land on the far side.
        let mut w = world_from(
            &[
                "..........",
                "P.........",
                "XXXX..XXXX",
            ],
            scenario_params(),
        );

        let mut jumped = false;
        let mut was_airborne = false;
        for frame in 0..300 {
            let jump_now = !jumped && w.player.body.on_ground && w.player.body.x >= 40.0;
            let input = FrameInput { jump: jump_now, ..RIGHT };
            step(&mut w, input);
            if jump_now {
                jumped = true;
            }
            assert!(
                !overlaps_solid(&w.player.body, &w.grid),
                "solid overlap mid-arc at frame {}",
                frame
            );
            if jumped && !w.player.body.on_ground {
                was_airborne = true;
            }
            if jumped && was_airborne && w.player.body.on_ground {
                break;
            }
        }

        assert!(jumped);
        assert!(was_airborne);
        assert!(w.player.body.on_ground, "never landed");
        assert_eq!(w.player.body.y, 16.0); // snapped onto the floor top
        assert!(w.player.body.x > 96.0, "landed short of the gap");
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn stomp_kills_enemy_and_bounces_player() {
        let mut w = world_from(
            &[
                "P.....",
                "...E..",
                "XXXXXX",
            ],
            scenario_params(),
        );
        // Drop the player straight onto the enemy's head
        w.player.body = KinematicBody::new(48.0, 0.0, TS, TS);
        w.player.body.vy = 4.0;

        let mut stomped = false;
        for _ in 0..20 {
            let events = step(&mut w, IDLE);
            if events.contains(&GameEvent::EnemyStomped { id: 0 }) {
                stomped = true;
                break;
            }
        }

        assert!(stomped);
        assert!(w.enemies.is_empty()); // removed after the stomp
        assert!(w.player.alive);
        assert_eq!(w.player.body.vy, -5.0); // half jump impulse
        assert_eq!(w.score, 100);
    }

    #[test]
    fn side_contact_kills_player() {
        let mut w = world_from(
            &[
                "P.....",
                "...E..",
                "XXXXXX",
            ],
            scenario_params(),
        );
        w.player.body = KinematicBody::new(8.0, 16.0, TS, TS);
        w.player.body.on_ground = true;

        let mut events = vec![];
        for _ in 0..40 {
            events = step(&mut w, RIGHT);
            if w.phase != Phase::Playing {
                break;
            }
        }

        assert_eq!(w.phase, Phase::Dying);
        assert!(!w.player.alive);
        assert!(events.contains(&GameEvent::PlayerDied));
        assert_eq!(w.enemies.len(), 1); // the enemy survives
    }

    #[test]
    fn falling_off_the_world_is_death_not_error() {
        let mut w = world_from(
            &[
                "......",
                "P.....",
                "XX....",
            ],
            scenario_params(),
        );

        let mut saw_death = false;
        for _ in 0..300 {
            let events = step(&mut w, RIGHT);
            if events.contains(&GameEvent::PlayerDied) {
                saw_death = true;
                break;
            }
        }

        assert!(saw_death);
        assert_eq!(w.phase, Phase::Dying);
    }

    #[test]
    fn running_past_the_right_edge_clears_the_level() {
        let mut w = world_from(
            &[
                "......",
                "P.....",
                "XXXXXX",
            ],
            scenario_params(),
        );

        let mut events = vec![];
        for _ in 0..60 {
            events = step(&mut w, RIGHT);
            if w.phase != Phase::Playing {
                break;
            }
        }

        assert_eq!(w.phase, Phase::LevelComplete);
        assert!(events.contains(&GameEvent::LevelCleared));
        assert_eq!(w.score, 400);
    }

    #[test]
    fn enemy_turns_at_walls() {
        let mut w = world_from(
            &[
                "P.....",
                "......",
                "XXXXXX",
            ],
            scenario_params(),
        );
        w.physics.enemy_speed = 2.0;
        // Patrol bounds wider than the level: only the wall can turn it
        w.enemies = vec![Enemy {
            id: 0,
            body: KinematicBody::new(32.0, 16.0, TS, TS),
            dir: -1.0,
            patrol_min: -1000.0,
            patrol_max: 1000.0,
            alive: true,
        }];
        // Wall the left edge off
        let rows: Vec<String> = ["P.....", "X.....", "XXXXXX"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        w.grid = TileGrid::from_rows(&rows, TS).unwrap().grid;
        w.player.body.x = 64.0; // out of the way
        w.player.body.y = -200.0;

        let mut flipped = false;
        for _ in 0..40 {
            step(&mut w, IDLE);
            if w.enemies[0].dir > 0.0 {
                flipped = true;
                break;
            }
        }
        assert!(flipped);
        assert_eq!(w.enemies[0].body.x, 16.0); // clamped on the wall face
    }

    #[test]
    fn step_is_inert_outside_playing() {
        let mut w = world_from(
            &[
                "P.....",
                "......",
                "XXXXXX",
            ],
            scenario_params(),
        );
        w.phase = Phase::Title;
        let x = w.player.body.x;
        assert!(step(&mut w, RIGHT).is_empty());
        assert_eq!(w.player.body.x, x);
    }

    #[test]
    fn jump_impulse_fires_once_through_step() {
        let mut w = world_from(
            &[
                "..........",
                "P.........",
                "XXXXXXXXXX",
            ],
            scenario_params(),
        );
        // Settle onto the floor first
        for _ in 0..5 {
            step(&mut w, IDLE);
        }
        assert!(w.player.body.on_ground);

        let jump_held = FrameInput { jump: true, ..IDLE };
        let mut impulses = 0;
        for _ in 0..120 {
            let events = step(&mut w, jump_held);
            impulses += events.iter().filter(|e| **e == GameEvent::PlayerJumped).count();
        }
        assert_eq!(impulses, 1);
    }
}
