/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_CONFIRM, KEYS_RESTART};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(2);

fn main() {
    let config = GameConfig::load();

    let mut world = WorldState::new(
        config.physics,
        config.tile_size,
        config.level_count,
        config.seed,
    );
    world.lives = config.lives;

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Pipeworks!");
    println!("Final Score: {}", world.score);
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        world.set_message("Gamepad connected", 90);
    }

    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, &gp, config)? {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            if world.paused {
                // Pause blocks simulation but keeps the blink timer alive
                world.anim_tick = world.anim_tick.wrapping_add(1);
            } else {
                match world.phase {
                    Phase::Playing => {
                        let events = step::step(world, merge_input(&kb, &gp));
                        process_sound_events(sound, &events);
                    }
                    Phase::Dying => tick_dying(world)?,
                    _ => {
                        world.anim_tick = world.anim_tick.wrapping_add(1);
                    }
                }

                // Message timer for phases the step doesn't cover
                if world.phase != Phase::Playing && world.message_timer > 0 {
                    world.message_timer -= 1;
                    if world.message_timer == 0 {
                        world.message.clear();
                    }
                }
            }
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Keyboard and gamepad intents merge with OR: either device may hold
/// a direction or the jump.
fn merge_input(kb: &InputState, gp: &GamepadState) -> FrameInput {
    let keys = kb.frame_input();
    FrameInput {
        left: keys.left || gp.left_held(),
        right: keys.right || gp.right_held(),
        jump: keys.jump || gp.jump_held(),
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::PlayerJumped => sfx.play_jump(),
            GameEvent::PlayerLanded => sfx.play_land(),
            GameEvent::EnemyStomped { .. } => sfx.play_stomp(),
            GameEvent::PlayerDied => sfx.play_die(),
            GameEvent::LevelCleared => sfx.play_clear(),
        }
    }
}

/// Reset to the title screen, preserving tuning and seed.
fn return_to_title(world: &mut WorldState, config: &GameConfig) {
    *world = WorldState::new(
        world.physics,
        world.tile_size,
        world.level_count,
        world.seed,
    );
    world.lives = config.lives;
}

fn start_new_game(world: &mut WorldState, config: &GameConfig) -> Result<(), Box<dyn std::error::Error>> {
    world.score = 0;
    world.lives = config.lives;
    world.load_level(0)?;
    Ok(())
}

/// Phase-level input: menus, pause, restart, quit.
/// Returns Ok(true) to quit the program.
fn handle_meta(
    world: &mut WorldState,
    kb: &InputState,
    gp: &GamepadState,
    config: &GameConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.pressed(KeyCode::Esc) || gp.cancel_pressed();

    // Pause toggle, any in-game phase
    if matches!(world.phase, Phase::Playing | Phase::LevelComplete) {
        if kb.any_pressed(&[KeyCode::Char('p'), KeyCode::Char('P')]) {
            world.paused = !world.paused;
            return Ok(false);
        }
        if world.paused {
            if esc {
                world.paused = false;
                return_to_title(world, config);
            }
            return Ok(false); // block everything else while paused
        }
    }

    match world.phase {
        // ── Title Screen ──
        Phase::Title => {
            if confirm {
                start_new_game(world, config)?;
            } else if kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) || esc {
                return Ok(true);
            }
        }

        // ── Playing ──
        Phase::Playing => {
            if esc {
                return_to_title(world, config);
            } else if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                world.restart_level()?;
                world.set_message("Stage restarted", 45);
            }
        }

        // ── Level Complete ──
        Phase::LevelComplete => {
            if confirm {
                let next = world.level + 1;
                if next >= world.level_count {
                    world.phase = Phase::GameComplete;
                    world.anim_tick = 0;
                } else {
                    world.load_level(next)?;
                }
            } else if esc {
                return_to_title(world, config);
            }
        }

        // ── Dying ──
        Phase::Dying => {
            // Can't skip
        }

        // ── Game Over ──
        Phase::GameOver => {
            if confirm {
                start_new_game(world, config)?;
            } else if esc {
                return_to_title(world, config);
            }
        }

        // ── Game Complete ──
        Phase::GameComplete => {
            if confirm || esc {
                return_to_title(world, config);
            }
        }
    }

    Ok(false)
}

// ── Death animation ──

const DYING_TICKS: u32 = 40;

fn tick_dying(world: &mut WorldState) -> Result<(), Box<dyn std::error::Error>> {
    world.anim_tick += 1;
    if world.anim_tick >= DYING_TICKS {
        world.lives = world.lives.saturating_sub(1);
        if world.lives == 0 {
            world.phase = Phase::GameOver;
            world.set_message("GAME OVER", 120);
        } else {
            // Same seed: the restarted layout is identical
            world.restart_level()?;
        }
    }
    Ok(())
}
