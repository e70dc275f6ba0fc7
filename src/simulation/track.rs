//! Tile-based track: surface classification, waypoint loop and start grid
//!
//! A track is built once from an ASCII layout and is read-only afterwards.
//! Switching tracks means building a new `Track`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::race::FinishLine;
use super::types::{Position, Surface};

/// Edge length of a square tile in world pixels
pub const TILE_SIZE: f32 = 128.0;

/// Distance from the finish line to the first start slot. Keeps the front
/// row outside every checkpoint radius of the first waypoint.
const GRID_FIRST_SLOT_OFFSET: f32 = 16.0;
/// Distance between consecutive start slot rows
const GRID_ROW_SPACING: f32 = 60.0;
/// Lateral offset of each start slot column from the centre line
const GRID_LANE_OFFSET: f32 = 24.0;
/// Number of start slots on every track
pub const GRID_SLOTS: usize = 6;

const OVAL_LAYOUT: &str = "
............
..r------7..
..|......|..
..|......|..
..|......|..
..|......|..
..|......|..
..|......|..
..L------J..
............
";

const FIGURE8_LAYOUT: &str = "
............
.r---7......
.|...|......
.|...|......
.L---+---7..
.....|...|..
.....|...|..
.....L---J..
............
";

/// Grid direction, also used as a compass heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// (column, row) step for moving one tile in this direction
    fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Vehicle heading in degrees for driving in this direction
    pub fn heading(self) -> f32 {
        match self {
            Direction::North => 0.0,
            Direction::West => 90.0,
            Direction::South => 180.0,
            Direction::East => 270.0,
        }
    }
}

/// Type of a single track tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Grass,
    RoadVertical,
    RoadHorizontal,
    CornerTopLeft,
    CornerTopRight,
    CornerBottomLeft,
    CornerBottomRight,
    Crossing,
}

impl TileKind {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(TileKind::Grass),
            '|' => Some(TileKind::RoadVertical),
            '-' => Some(TileKind::RoadHorizontal),
            'r' => Some(TileKind::CornerTopLeft),
            '7' => Some(TileKind::CornerTopRight),
            'L' => Some(TileKind::CornerBottomLeft),
            'J' => Some(TileKind::CornerBottomRight),
            '+' => Some(TileKind::Crossing),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            TileKind::Grass => '.',
            TileKind::RoadVertical => '|',
            TileKind::RoadHorizontal => '-',
            TileKind::CornerTopLeft => 'r',
            TileKind::CornerTopRight => '7',
            TileKind::CornerBottomLeft => 'L',
            TileKind::CornerBottomRight => 'J',
            TileKind::Crossing => '+',
        }
    }

    pub fn is_road(self) -> bool {
        self != TileKind::Grass
    }

    /// Sides of the tile the road connects to
    fn openings(self) -> &'static [Direction] {
        use Direction::*;
        match self {
            TileKind::Grass => &[],
            TileKind::RoadVertical => &[North, South],
            TileKind::RoadHorizontal => &[East, West],
            TileKind::CornerTopLeft => &[East, South],
            TileKind::CornerTopRight => &[West, South],
            TileKind::CornerBottomLeft => &[North, East],
            TileKind::CornerBottomRight => &[North, West],
            TileKind::Crossing => &[North, East, South, West],
        }
    }

    /// Side a car leaves through after entering from `entry`.
    /// Crossings are driven straight through.
    fn exit_for(self, entry: Direction) -> Option<Direction> {
        let openings = self.openings();
        if !openings.contains(&entry) {
            return None;
        }
        match self {
            TileKind::Crossing => Some(entry.opposite()),
            _ => openings.iter().copied().find(|side| *side != entry),
        }
    }
}

/// Built-in tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackId {
    Oval,
    Figure8,
}

impl TrackId {
    pub const ALL: [TrackId; 2] = [TrackId::Oval, TrackId::Figure8];

    pub fn name(self) -> &'static str {
        match self {
            TrackId::Oval => "Oval",
            TrackId::Figure8 => "Figure-8",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        let wanted: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| {
                id.name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .eq_ignore_ascii_case(&wanted)
            })
            .with_context(|| format!("Unknown track '{}'", name))
    }

    fn layout(self) -> &'static str {
        match self {
            TrackId::Oval => OVAL_LAYOUT,
            TrackId::Figure8 => FIGURE8_LAYOUT,
        }
    }

    /// (column, row) of the start tile and the direction cars leave it in
    fn start(self) -> ((usize, usize), Direction) {
        match self {
            TrackId::Oval => ((5, 8), Direction::West),
            TrackId::Figure8 => ((7, 7), Direction::West),
        }
    }
}

/// Immutable tile grid plus the facts derived from it
#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    tiles: Vec<Vec<TileKind>>,
    cols: usize,
    rows: usize,
    tile_size: f32,
    waypoints: Vec<Position>,
    finish_line: FinishLine,
    start_cell: (usize, usize),
    start_direction: Direction,
}

impl Track {
    /// Build one of the built-in tracks
    pub fn preset(id: TrackId) -> Result<Self> {
        let (start_cell, start_direction) = id.start();
        Self::from_layout(id.name(), id.layout(), start_cell, start_direction)
            .with_context(|| format!("Built-in track '{}' is malformed", id.name()))
    }

    /// Parse an ASCII layout and derive the waypoint loop and finish line.
    ///
    /// The finish line sits on the centre of the start tile and is crossed
    /// in the decreasing-x direction, so the start tile must be driven west.
    pub fn from_layout(
        name: &str,
        layout: &str,
        start_cell: (usize, usize),
        start_direction: Direction,
    ) -> Result<Self> {
        let mut tiles = Vec::new();
        for (row, line) in layout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .enumerate()
        {
            let parsed = line
                .chars()
                .enumerate()
                .map(|(col, c)| {
                    TileKind::from_char(c).with_context(|| {
                        format!("Unknown tile '{}' at column {}, row {}", c, col, row)
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            tiles.push(parsed);
        }

        let rows = tiles.len();
        let cols = tiles.first().map(Vec::len).unwrap_or(0);
        if rows == 0 || cols == 0 {
            bail!("Track layout is empty");
        }
        if let Some(row) = tiles.iter().position(|r| r.len() != cols) {
            bail!("Track row {} has {} tiles, expected {}", row, tiles[row].len(), cols);
        }

        if start_direction != Direction::West {
            bail!("The finish line is crossed westwards, so the start tile must be driven west");
        }
        let (start_col, start_row) = start_cell;
        let start_tile = tiles
            .get(start_row)
            .and_then(|r| r.get(start_col))
            .copied()
            .context("Start tile is outside the grid")?;
        if start_tile.exit_for(start_direction.opposite()) != Some(start_direction) {
            bail!(
                "Start tile '{}' cannot be driven {:?}",
                start_tile.to_char(),
                start_direction
            );
        }

        let mut track = Self {
            name: name.to_string(),
            tiles,
            cols,
            rows,
            tile_size: TILE_SIZE,
            waypoints: Vec::new(),
            finish_line: FinishLine::new(0.0, 0.0, 0.0),
            start_cell,
            start_direction,
        };

        let start_center = track.tile_center(start_col, start_row);
        let half = track.tile_size / 2.0;
        track.finish_line = FinishLine::new(
            start_center.x,
            start_center.y - half,
            start_center.y + half,
        );
        track.waypoints = track.trace_waypoints()?;
        Ok(track)
    }

    /// Walk the road from the start tile until it returns to it, emitting
    /// tile centres in driving order. The start tile is the last waypoint.
    fn trace_waypoints(&self) -> Result<Vec<Position>> {
        let mut waypoints = Vec::new();
        let mut cell = self.start_cell;
        let mut heading = self.start_direction;
        // Crossings are visited twice, nothing more
        let max_steps = self.cols * self.rows * 2;

        for _ in 0..max_steps {
            let (dc, dr) = heading.offset();
            let next_col = cell.0 as isize + dc;
            let next_row = cell.1 as isize + dr;
            if next_col < 0
                || next_row < 0
                || next_col as usize >= self.cols
                || next_row as usize >= self.rows
            {
                bail!("Road runs off the grid at column {}, row {}", cell.0, cell.1);
            }
            let next = (next_col as usize, next_row as usize);
            let tile = self.tiles[next.1][next.0];

            heading = tile.exit_for(heading.opposite()).with_context(|| {
                format!("Road is broken at column {}, row {}", next.0, next.1)
            })?;
            waypoints.push(self.tile_center(next.0, next.1));
            cell = next;

            if cell == self.start_cell && heading == self.start_direction {
                return Ok(waypoints);
            }
        }

        bail!("Road from the start tile never closes into a loop")
    }

    /// Classify a world point. Anything outside the grid is off-road.
    pub fn classify(&self, x: f32, y: f32) -> Surface {
        if x < 0.0 || y < 0.0 || !x.is_finite() || !y.is_finite() {
            return Surface::OffRoad;
        }
        let col = (x / self.tile_size) as usize;
        let row = (y / self.tile_size) as usize;
        match self.tile(col, row) {
            Some(tile) if tile.is_road() => Surface::Road,
            _ => Surface::OffRoad,
        }
    }

    pub fn tile(&self, col: usize, row: usize) -> Option<TileKind> {
        self.tiles.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn tile_center(&self, col: usize, row: usize) -> Position {
        Position::new(
            (col as f32 + 0.5) * self.tile_size,
            (row as f32 + 0.5) * self.tile_size,
        )
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// World size in pixels (width, height)
    pub fn world_size(&self) -> (f32, f32) {
        (
            self.cols as f32 * self.tile_size,
            self.rows as f32 * self.tile_size,
        )
    }

    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    pub fn finish_line(&self) -> &FinishLine {
        &self.finish_line
    }

    pub fn start_heading(&self) -> f32 {
        self.start_direction.heading()
    }

    /// Start pose of grid slot `index` (0 = pole). Slots are staggered in
    /// two lanes just past the finish line; indices wrap after `GRID_SLOTS`.
    pub fn start_slot(&self, index: usize) -> (Position, f32) {
        let slot = index % GRID_SLOTS;
        let rank = (slot / 2) as f32;
        let lane = if slot % 2 == 0 { -1.0 } else { 1.0 };

        let (dc, dr) = self.start_direction.offset();
        let (dir_x, dir_y) = (dc as f32, dr as f32);
        // Perpendicular to the direction of travel
        let (perp_x, perp_y) = (-dir_y, dir_x);

        let along = GRID_FIRST_SLOT_OFFSET + rank * GRID_ROW_SPACING;
        let center = self.tile_center(self.start_cell.0, self.start_cell.1);
        let position = Position::new(
            center.x + dir_x * along + perp_x * lane * GRID_LANE_OFFSET,
            center.y + dir_y * along + perp_y * lane * GRID_LANE_OFFSET,
        );
        (position, self.start_heading())
    }

    /// Index of the first waypoint still ahead of a grid position along the
    /// start direction. A back-row car already past waypoint 0 chases the
    /// next one instead of turning round.
    pub fn start_waypoint(&self, position: &Position) -> usize {
        let (dc, dr) = self.start_direction.offset();
        self.waypoints
            .iter()
            .position(|w| (w.x - position.x) * dc as f32 + (w.y - position.y) * dr as f32 > 0.0)
            .unwrap_or(0)
    }
}
