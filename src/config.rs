/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// Physics values are per-frame pixel units at the fixed 60 Hz step.
/// Speeds are capped at `tile_size` on load so one frame can never
/// displace a body by more than one tile (the no-tunneling bound).

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::physics::PhysicsParams;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsParams,
    pub tile_size: f32,
    pub tick_rate_ms: u64,
    pub lives: u32,
    pub level_count: u32,
    pub seed: u64,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_max_fall")]
    max_fall_speed: f32,
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f32,
    #[serde(default = "default_enemy_speed")]
    enemy_speed: f32,
    #[serde(default = "default_tile_size")]
    tile_size: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_level_count")]
    level_count: u32,
    #[serde(default = "default_seed")]
    seed: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump_btns")]
    jump: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

// ── Defaults ──

fn default_gravity() -> f32 { 0.5 }
fn default_max_fall() -> f32 { 20.0 }
fn default_move_speed() -> f32 { 5.0 }
fn default_jump_velocity() -> f32 { -12.0 }
fn default_enemy_speed() -> f32 { 1.5 }
fn default_tile_size() -> f32 { 40.0 }

fn default_tick_rate() -> u64 { 16 }   // ~60 Hz
fn default_lives() -> u32 { 5 }
fn default_level_count() -> u32 { 32 } // 8 worlds x 4 stages
fn default_seed() -> u64 { 1988 }

fn default_jump_btns() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            max_fall_speed: default_max_fall(),
            move_speed: default_move_speed(),
            jump_velocity: default_jump_velocity(),
            enemy_speed: default_enemy_speed(),
            tile_size: default_tile_size(),
        }
    }
}

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            tick_rate_ms: default_tick_rate(),
            lives: default_lives(),
            level_count: default_level_count(),
            seed: default_seed(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump_btns(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        GameConfig::from_toml(toml_cfg)
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        let tile_size = if toml_cfg.physics.tile_size > 0.0 {
            toml_cfg.physics.tile_size
        } else {
            eprintln!("Warning: tile_size must be positive; using default.");
            default_tile_size()
        };

        // Per-frame displacement must stay under one tile
        let max_fall_speed = cap_speed("max_fall_speed", toml_cfg.physics.max_fall_speed, tile_size);
        let move_speed = cap_speed("move_speed", toml_cfg.physics.move_speed, tile_size);
        let enemy_speed = cap_speed("enemy_speed", toml_cfg.physics.enemy_speed, tile_size);

        GameConfig {
            physics: PhysicsParams {
                gravity: toml_cfg.physics.gravity,
                max_fall_speed,
                move_speed,
                jump_velocity: toml_cfg.physics.jump_velocity,
                enemy_speed,
            },
            tile_size,
            tick_rate_ms: toml_cfg.game.tick_rate_ms,
            lives: toml_cfg.game.lives,
            level_count: toml_cfg.game.level_count.max(1),
            seed: toml_cfg.game.seed,
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
            },
        }
    }
}

fn cap_speed(name: &str, value: f32, tile_size: f32) -> f32 {
    if value > tile_size {
        eprintln!(
            "Warning: {} = {} exceeds tile_size {}; capping to avoid tunneling.",
            name, value, tile_size
        );
        tile_size
    } else {
        value
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_tables() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        let game = GameConfig::from_toml(cfg);
        assert_eq!(game.tile_size, 40.0);
        assert_eq!(game.physics.move_speed, 5.0);
        assert_eq!(game.tick_rate_ms, 16);
        assert_eq!(game.level_count, 32);
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let cfg: TomlConfig = toml::from_str("[physics]\ngravity = 0.8\n").unwrap();
        let game = GameConfig::from_toml(cfg);
        assert_eq!(game.physics.gravity, 0.8);
        assert_eq!(game.physics.jump_velocity, -12.0);
    }

    #[test]
    fn speeds_are_capped_at_tile_size() {
        let cfg: TomlConfig =
            toml::from_str("[physics]\ntile_size = 16.0\nmax_fall_speed = 99.0\nmove_speed = 30.0\n")
                .unwrap();
        let game = GameConfig::from_toml(cfg);
        assert_eq!(game.physics.max_fall_speed, 16.0);
        assert_eq!(game.physics.move_speed, 16.0);
    }
}
