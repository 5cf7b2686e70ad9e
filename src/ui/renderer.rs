/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (a grid of Cells)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// One world tile maps to CELL_W terminal columns and one row. The
/// camera offset is pixel-valued; the renderer snaps it to whole tile
/// columns. Entities come in through the RenderSnapshot; the renderer
/// never reads bodies, velocities, or AI state.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Facing;
use crate::domain::tile::Tile;
use crate::sim::snapshot::{self, RenderSnapshot, SpriteKind};
use crate::sim::world::{Phase, WorldState};

// ── Palette ──

const BASE_BG: Color = Color::Rgb { r: 24, g: 36, b: 64 }; // dusk sky
const GROUND: Color = Color::Rgb { r: 150, g: 78, b: 22 };
const QUESTION_BG: Color = Color::Rgb { r: 228, g: 186, b: 16 };
const PLAYER_BG: Color = Color::Rgb { r: 208, g: 44, b: 32 };
const ENEMY_BG: Color = Color::Rgb { r: 44, g: 148, b: 64 };
const ENEMY_ALT_BG: Color = Color::Rgb { r: 148, g: 96, b: 36 };
const HUD_FG: Color = Color::Rgb { r: 235, g: 235, b: 235 };
const DIM_FG: Color = Color::Rgb { r: 140, g: 150, b: 170 };
const GOLD_FG: Color = Color::Rgb { r: 255, g: 214, b: 64 };

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: BASE_BG,
    };

    /// Sentinel used to invalidate the back buffer: differs from any
    /// real cell, so every position gets re-emitted.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell { ch, fg, bg });
            cx += 1;
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = (self.width.saturating_sub(s.chars().count())) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── Renderer ──

/// Terminal columns per world tile.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        // Feed the camera its viewport width (pixels) from the terminal
        let visible_tiles = (self.term_w / CELL_W).min(world.grid.width().max(1));
        world.camera.viewport_w = visible_tiles as f32 * world.tile_size;
        world.camera.update(&world.player.body.aabb());

        // Phase change → full repaint for a clean transition
        let phase_changed = self.last_phase != Some(world.phase);
        if phase_changed {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();

        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::GameOver => self.compose_game_over(world),
            Phase::GameComplete => self.compose_game_complete(world),
            Phase::Playing | Phase::Dying | Phase::LevelComplete => {
                let snap = snapshot::capture(world);
                self.compose_game(world, &snap, visible_tiles);
            }
        }

        if world.paused {
            self.front.put_centered(
                self.term_h / 2,
                "  PAUSED  [P] Resume  ",
                HUD_FG,
                BASE_BG,
            );
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Screens ──

    fn compose_title(&mut self, world: &WorldState) {
        let mid = self.term_h / 2;
        self.front.put_centered(mid.saturating_sub(6), "P I P E W O R K S", GOLD_FG, BASE_BG);
        self.front.put_centered(mid.saturating_sub(4), "* Overworld Circuit *", HUD_FG, BASE_BG);
        self.front.put_centered(mid.saturating_sub(1), "ENTER      start", DIM_FG, BASE_BG);
        self.front.put_centered(mid, "A/D or ◄ ► run    SPACE jump", DIM_FG, BASE_BG);
        self.front.put_centered(mid + 1, "R restart level    ESC quit", DIM_FG, BASE_BG);
        self.front.put_centered(
            mid + 4,
            &format!("{} stages await", world.level_count),
            DIM_FG,
            BASE_BG,
        );
        if world.message_timer > 0 {
            self.front.put_centered(mid + 6, &world.message, GOLD_FG, BASE_BG);
        }
    }

    fn compose_game_over(&mut self, world: &WorldState) {
        let mid = self.term_h / 2;
        self.front.put_centered(mid.saturating_sub(2), "G A M E   O V E R", PLAYER_BG, BASE_BG);
        self.front.put_centered(mid, &format!("Score  {}", world.score), HUD_FG, BASE_BG);
        self.front.put_centered(mid + 2, "ENTER retry    ESC title", DIM_FG, BASE_BG);
    }

    fn compose_game_complete(&mut self, world: &WorldState) {
        let mid = self.term_h / 2;
        self.front.put_centered(mid.saturating_sub(2), "CIRCUIT COMPLETE!", GOLD_FG, BASE_BG);
        self.front.put_centered(
            mid,
            &format!("All {} stages cleared / score {}", world.level_count, world.score),
            HUD_FG,
            BASE_BG,
        );
        self.front.put_centered(mid + 2, "ENTER or ESC for title", DIM_FG, BASE_BG);
    }

    fn compose_game(&mut self, world: &WorldState, snap: &RenderSnapshot, visible_tiles: usize) {
        self.compose_hud(world);

        let ts = world.tile_size;
        let cam_col = (snap.camera_x / ts).floor() as i32;
        let rows = world.grid.height().min(self.term_h.saturating_sub(MAP_ROW + 2));

        // Tiles
        for sy in 0..rows {
            for sx in 0..visible_tiles {
                let col = cam_col + sx as i32;
                let (left, right) = tile_cells(world.grid.tile_at(col, sy as i32));
                self.front.set(sx * CELL_W, MAP_ROW + sy, left);
                self.front.set(sx * CELL_W + 1, MAP_ROW + sy, right);
            }
        }

        // Sprites (player blinks during the death animation)
        for sprite in &snap.sprites {
            if sprite.kind == SpriteKind::Player
                && world.phase == Phase::Dying
                && world.anim_tick % 4 >= 2
            {
                continue;
            }
            let col = (sprite.aabb.center_x() / ts).floor() as i32 - cam_col;
            let row = ((sprite.aabb.y + sprite.aabb.h / 2.0) / ts).floor() as i32;
            if col < 0 || col >= visible_tiles as i32 || row < 0 || row >= rows as i32 {
                continue;
            }
            let (left, right) = sprite_cells(sprite.kind, sprite.facing, sprite.id);
            self.front.set(col as usize * CELL_W, MAP_ROW + row as usize, left);
            self.front.set(col as usize * CELL_W + 1, MAP_ROW + row as usize, right);
        }

        // Message line under the map
        let msg_row = MAP_ROW + rows + 1;
        if world.message_timer > 0 || !world.message.is_empty() {
            self.front.put_centered(msg_row, &world.message, GOLD_FG, BASE_BG);
        }
        if world.phase == Phase::LevelComplete {
            self.front
                .put_centered(msg_row + 1, "ENTER for the next stage", DIM_FG, BASE_BG);
        }
    }

    fn compose_hud(&mut self, world: &WorldState) {
        let stage = format!("WORLD {}-{}", world.level / 4 + 1, world.level % 4 + 1);
        let hud = format!(
            "{}   SCORE {:06}   LIVES x{}   TIME {:04}",
            stage,
            world.score,
            world.lives,
            world.tick / 60
        );
        self.front.put_str(1, HUD_ROW, &hud, HUD_FG, BASE_BG);
    }

    // ── Diff flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = None;
        let mut last_bg = None;
        let mut cursor_at: Option<(usize, usize)> = None;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.cells[y * self.front.width + x];
                if cell == self.back.cells[y * self.back.width + x] {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if last_fg != Some(cell.fg) {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = Some(cell.fg);
                }
                if last_bg != Some(cell.bg) {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = Some(cell.bg);
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ── Tile and sprite looks ──

fn tile_cells(tile: Tile) -> (Cell, Cell) {
    match tile {
        Tile::Empty => (Cell::BLANK, Cell::BLANK),
        Tile::Solid => {
            let c = Cell { ch: ' ', fg: BASE_BG, bg: GROUND };
            (c, c)
        }
        Tile::Question => (
            Cell { ch: '?', fg: Color::Black, bg: QUESTION_BG },
            Cell { ch: ' ', fg: Color::Black, bg: QUESTION_BG },
        ),
    }
}

fn sprite_cells(kind: SpriteKind, facing: Facing, id: usize) -> (Cell, Cell) {
    match kind {
        SpriteKind::Player => {
            let (l, r) = match facing {
                Facing::Right => (' ', '>'),
                Facing::Left => ('<', ' '),
            };
            (
                Cell { ch: l, fg: Color::White, bg: PLAYER_BG },
                Cell { ch: r, fg: Color::White, bg: PLAYER_BG },
            )
        }
        SpriteKind::Enemy => {
            // Two enemy liveries, alternating by id
            let bg = if id % 2 == 1 { ENEMY_BG } else { ENEMY_ALT_BG };
            (
                Cell { ch: 'o', fg: Color::Black, bg },
                Cell { ch: 'o', fg: Color::Black, bg },
            )
        }
    }
}
