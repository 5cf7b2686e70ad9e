/// Tile grid and pixel-space rectangles.
///
/// ## Coordinate model
///
/// Two spaces, converted only here:
///   - GRID  : (col, row) tile indices, row-major, row 0 at the top
///   - PIXEL : f32 points; one tile spans `tile_size` pixels per axis
///
/// The grid is immutable after construction. Out-of-range probes return
/// `Tile::Empty` (open air) so collision code near the level edges needs
/// no bounds branches; `in_bounds` exists for the cases where being
/// outside the grid is meaningful (an entity fell off the world).
///
/// ## Level text legend
///   'X' = Solid          '?' = Question block
///   'P' = Player spawn   'E' = Enemy spawn
///   anything else = Empty

use std::fmt;

use super::tile::Tile;

/// Axis-aligned box in pixel space. Used for entities and, on demand,
/// for tile bounds; tiles never store their own rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Aabb { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    /// Strict overlap: boxes that merely touch along an edge do NOT
    /// intersect. A body resting exactly on a floor tile is resolved,
    /// not re-collided every frame.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Why a level failed to construct. Fatal at load, never recovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidLevel {
    NoRows,
    RaggedRows { row: usize },
    MissingPlayerSpawn,
}

impl fmt::Display for InvalidLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidLevel::NoRows => write!(f, "level has no rows"),
            InvalidLevel::RaggedRows { row } => {
                write!(f, "level row {} has a different length than row 0", row)
            }
            InvalidLevel::MissingPlayerSpawn => write!(f, "level has no player spawn marker"),
        }
    }
}

impl std::error::Error for InvalidLevel {}

/// A parsed level: the grid plus the spawn points extracted from it.
#[derive(Debug)]
pub struct ParsedLevel {
    pub grid: TileGrid,
    pub player_spawn: (usize, usize),
    pub enemy_spawns: Vec<(usize, usize)>,
}

/// Immutable-after-construction tile map.
#[derive(Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f32,
    cells: Vec<Vec<Tile>>,
}

impl TileGrid {
    /// Parse level text rows. Spawn markers become Empty cells and are
    /// returned separately. Fails on ragged rows or a missing 'P'.
    pub fn from_rows(rows: &[String], tile_size: f32) -> Result<ParsedLevel, InvalidLevel> {
        if rows.is_empty() {
            return Err(InvalidLevel::NoRows);
        }
        let width = rows[0].chars().count();
        if width == 0 {
            return Err(InvalidLevel::NoRows);
        }

        let mut cells = Vec::with_capacity(rows.len());
        let mut player_spawn = None;
        let mut enemy_spawns = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(InvalidLevel::RaggedRows { row: y });
            }
            let mut line = Vec::with_capacity(width);
            for (x, ch) in row.chars().enumerate() {
                let tile = match ch {
                    'X' => Tile::Solid,
                    '?' => Tile::Question,
                    'P' => {
                        player_spawn = Some((x, y));
                        Tile::Empty
                    }
                    'E' => {
                        enemy_spawns.push((x, y));
                        Tile::Empty
                    }
                    _ => Tile::Empty,
                };
                line.push(tile);
            }
            cells.push(line);
        }

        let player_spawn = player_spawn.ok_or(InvalidLevel::MissingPlayerSpawn)?;

        Ok(ParsedLevel {
            grid: TileGrid {
                width,
                height: rows.len(),
                tile_size,
                cells,
            },
            player_spawn,
            enemy_spawns,
        })
    }

    /// Zero-size placeholder for the pre-load session state.
    pub fn empty(tile_size: f32) -> Self {
        TileGrid {
            width: 0,
            height: 0,
            tile_size,
            cells: vec![],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn width_px(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn height_px(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    /// Tile at (col, row). Out-of-range (including negative) is open
    /// air, so probes near the edges need no branches.
    #[inline]
    pub fn tile_at(&self, col: i32, row: i32) -> Tile {
        if col < 0 || row < 0 {
            return Tile::Empty;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.width || row >= self.height {
            return Tile::Empty;
        }
        self.cells[row][col]
    }

    /// Is (col, row) inside the grid? For logic where being outside is
    /// meaningful, unlike `tile_at` which treats outside as Empty.
    #[inline]
    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.width && (row as usize) < self.height
    }

    /// Pixel bounds of a tile cell, derived on demand.
    #[inline]
    pub fn tile_aabb(&self, col: i32, row: i32) -> Aabb {
        Aabb::new(
            col as f32 * self.tile_size,
            row as f32 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(r: &[&str]) -> Vec<String> {
        r.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_legend_and_spawns() {
        let parsed = TileGrid::from_rows(
            &rows(&[
                "....?...",
                ".P....E.",
                "XXXXXXXX",
            ]),
            16.0,
        )
        .unwrap();

        assert_eq!(parsed.grid.width(), 8);
        assert_eq!(parsed.grid.height(), 3);
        assert_eq!(parsed.player_spawn, (1, 1));
        assert_eq!(parsed.enemy_spawns, vec![(6, 1)]);
        assert_eq!(parsed.grid.tile_at(4, 0), Tile::Question);
        assert_eq!(parsed.grid.tile_at(0, 2), Tile::Solid);
        // Spawn markers leave Empty cells behind
        assert_eq!(parsed.grid.tile_at(1, 1), Tile::Empty);
        assert_eq!(parsed.grid.tile_at(6, 1), Tile::Empty);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = TileGrid::from_rows(&rows(&["P...", "XXX"]), 16.0).unwrap_err();
        assert_eq!(err, InvalidLevel::RaggedRows { row: 1 });
    }

    #[test]
    fn missing_player_spawn_rejected() {
        let err = TileGrid::from_rows(&rows(&["....", "XXXX"]), 16.0).unwrap_err();
        assert_eq!(err, InvalidLevel::MissingPlayerSpawn);
    }

    #[test]
    fn empty_input_rejected() {
        assert_eq!(TileGrid::from_rows(&[], 16.0).unwrap_err(), InvalidLevel::NoRows);
    }

    #[test]
    fn out_of_range_is_open_air() {
        let parsed = TileGrid::from_rows(&rows(&["P.", "XX"]), 16.0).unwrap();
        let g = &parsed.grid;
        assert_eq!(g.tile_at(-1, 0), Tile::Empty);
        assert_eq!(g.tile_at(0, -3), Tile::Empty);
        assert_eq!(g.tile_at(2, 0), Tile::Empty);
        assert_eq!(g.tile_at(0, 2), Tile::Empty);
        assert!(g.in_bounds(1, 1));
        assert!(!g.in_bounds(2, 0));
        assert!(!g.in_bounds(-1, 1));
    }

    #[test]
    fn tile_aabb_in_pixel_space() {
        let parsed = TileGrid::from_rows(&rows(&["P.", "XX"]), 16.0).unwrap();
        let t = parsed.grid.tile_aabb(1, 1);
        assert_eq!(t, Aabb::new(16.0, 16.0, 16.0, 16.0));
        assert_eq!(parsed.grid.width_px(), 32.0);
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = Aabb::new(9.5, 0.0, 10.0, 10.0);
        assert!(a.intersects(&c));
    }
}
