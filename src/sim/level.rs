//! Level definitions, level sources and the level catalog
//!
//! Levels are described as JSON documents with a character grid:
//!
//! ```json
//! { "ball_speed": 300.0, "lives": 3, "background": "bg1",
//!   "rows": ["NNNNNNNNNN", "HH..UU..HH"] }
//! ```
//!
//! `N` = normal, `H` = hard, `U` = unbreakable, `.` or space = empty.
//! A level that fails to load is replaced by a procedurally generated one so
//! the game always has something to play.

use std::fmt;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Brick, BrickKind};
use crate::consts::*;

/// Deepest row a layout may use (keeps bricks well above the paddle)
pub const MAX_LAYOUT_ROWS: usize = 16;

/// Number of procedural levels used when a source has none
pub const FALLBACK_LEVEL_COUNT: usize = 3;

const BUILTIN_LEVELS: [&str; 3] = [
    include_str!("../../levels/level1.json"),
    include_str!("../../levels/level2.json"),
    include_str!("../../levels/level3.json"),
];

/// Errors raised while reading level data
#[derive(Debug)]
pub enum LevelError {
    /// JSON could not be parsed
    Parse(serde_json::Error),
    /// The source has no level at this index
    Missing(usize),
    /// No rows at all
    EmptyLayout,
    /// More rows than fit above the paddle
    TooManyRows(usize),
    /// Row wider than the brick grid
    RowTooWide { row: usize, width: usize },
    /// Character that isn't a known brick code
    UnknownCell { row: usize, col: usize, cell: char },
    /// Nothing breakable, so the level would complete instantly
    NoBreakableBricks,
    /// Ball speed must be positive and finite
    InvalidBallSpeed(f32),
    /// A level must grant at least one life
    ZeroLives,
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Parse(e) => write!(f, "Level parse error: {e}"),
            LevelError::Missing(index) => write!(f, "No level data for index {index}"),
            LevelError::EmptyLayout => write!(f, "Level layout has no rows"),
            LevelError::TooManyRows(n) => {
                write!(f, "Level layout has {n} rows (max {MAX_LAYOUT_ROWS})")
            }
            LevelError::RowTooWide { row, width } => {
                write!(f, "Row {row} is {width} cells wide (max {BRICK_COLS})")
            }
            LevelError::UnknownCell { row, col, cell } => {
                write!(f, "Unknown brick code {cell:?} at row {row}, column {col}")
            }
            LevelError::NoBreakableBricks => write!(f, "Level has no breakable bricks"),
            LevelError::InvalidBallSpeed(speed) => write!(f, "Invalid ball speed: {speed}"),
            LevelError::ZeroLives => write!(f, "Level must start with at least one life"),
        }
    }
}

impl std::error::Error for LevelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LevelError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LevelError {
    fn from(e: serde_json::Error) -> Self {
        LevelError::Parse(e)
    }
}

fn default_ball_speed() -> f32 {
    BALL_SPEED
}

fn default_lives() -> u32 {
    INITIAL_LIVES
}

/// Raw level document as supplied by a level source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelFile {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_ball_speed")]
    pub ball_speed: f32,
    #[serde(default = "default_lives")]
    pub lives: u32,
    #[serde(default)]
    pub background: String,
    pub rows: Vec<String>,
}

/// Supplier of level documents, indexed from 0
pub trait LevelSource {
    fn level_count(&self) -> usize;
    fn load(&self, index: usize) -> Result<LevelFile, LevelError>;
}

/// Level source backed by in-memory JSON documents
#[derive(Debug, Clone, Default)]
pub struct JsonLevelSource {
    docs: Vec<String>,
}

impl JsonLevelSource {
    pub fn new(docs: Vec<String>) -> Self {
        Self { docs }
    }

    /// The levels shipped with the crate
    pub fn builtin() -> Self {
        Self::new(BUILTIN_LEVELS.iter().map(|s| s.to_string()).collect())
    }
}

impl LevelSource for JsonLevelSource {
    fn level_count(&self) -> usize {
        self.docs.len()
    }

    fn load(&self, index: usize) -> Result<LevelFile, LevelError> {
        let doc = self.docs.get(index).ok_or(LevelError::Missing(index))?;
        Ok(serde_json::from_str(doc)?)
    }
}

/// Brick in grid cell (row, col)
pub fn grid_brick(row: usize, col: usize, kind: BrickKind) -> Brick {
    let x = BRICK_OFFSET_X + col as f32 * (BRICK_WIDTH + BRICK_PADDING);
    let y = BRICK_OFFSET_Y + row as f32 * (BRICK_HEIGHT + BRICK_PADDING);
    Brick::new(
        Vec2::new(x, y),
        Vec2::new(BRICK_WIDTH, BRICK_HEIGHT),
        kind,
        BRICK_COLORS[row % BRICK_COLORS.len()],
    )
}

/// Row-dependent brick kind for procedural layouts.
///
/// `level` is 1-based, `roll` is 0-99.
pub fn procedural_brick_kind(row: usize, level: usize, roll: u32) -> BrickKind {
    if level > 3 && row < 2 && roll < 20 {
        BrickKind::Unbreakable
    } else if level > 1 && roll < 30 {
        BrickKind::hard()
    } else {
        BrickKind::Normal
    }
}

/// A playable level: brick prototypes plus per-level parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Position in the catalog (0-based)
    pub index: usize,
    pub name: String,
    pub ball_speed: f32,
    pub initial_lives: u32,
    /// Background reference for the presentation layer
    pub background: String,
    /// True if generated because the level data was unusable
    pub procedural: bool,
    prototype: Vec<Brick>,
}

impl Level {
    /// Build and validate a level from a raw document
    pub fn from_file(index: usize, file: &LevelFile) -> Result<Self, LevelError> {
        if !file.ball_speed.is_finite() || file.ball_speed <= 0.0 {
            return Err(LevelError::InvalidBallSpeed(file.ball_speed));
        }
        if file.lives == 0 {
            return Err(LevelError::ZeroLives);
        }
        if file.rows.is_empty() {
            return Err(LevelError::EmptyLayout);
        }
        if file.rows.len() > MAX_LAYOUT_ROWS {
            return Err(LevelError::TooManyRows(file.rows.len()));
        }

        let mut prototype = Vec::new();
        for (row, line) in file.rows.iter().enumerate() {
            let width = line.chars().count();
            if width > BRICK_COLS {
                return Err(LevelError::RowTooWide { row, width });
            }
            for (col, cell) in line.chars().enumerate() {
                let kind = match cell {
                    'N' | 'n' => BrickKind::Normal,
                    'H' | 'h' => BrickKind::hard(),
                    'U' | 'u' => BrickKind::Unbreakable,
                    '.' | ' ' => continue,
                    other => {
                        return Err(LevelError::UnknownCell {
                            row,
                            col,
                            cell: other,
                        });
                    }
                };
                prototype.push(grid_brick(row, col, kind));
            }
        }

        if !prototype.iter().any(|b| b.kind.is_breakable()) {
            return Err(LevelError::NoBreakableBricks);
        }

        let name = if file.name.is_empty() {
            format!("Level {}", index + 1)
        } else {
            file.name.clone()
        };

        Ok(Self {
            index,
            name,
            ball_speed: file.ball_speed,
            initial_lives: file.lives,
            background: file.background.clone(),
            procedural: false,
            prototype,
        })
    }

    /// Parse and validate a JSON level document
    pub fn from_json(index: usize, json: &str) -> Result<Self, LevelError> {
        let file: LevelFile = serde_json::from_str(json)?;
        Self::from_file(index, &file)
    }

    /// Full grid with row-dependent brick kinds
    pub fn procedural<R: Rng>(index: usize, rng: &mut R) -> Self {
        let number = index + 1;
        let mut prototype = Vec::with_capacity(BRICK_ROWS * BRICK_COLS);
        for row in 0..BRICK_ROWS {
            for col in 0..BRICK_COLS {
                let kind = procedural_brick_kind(row, number, rng.random_range(0..100));
                prototype.push(grid_brick(row, col, kind));
            }
        }

        Self {
            index,
            name: format!("Level {number}"),
            ball_speed: BALL_SPEED,
            initial_lives: INITIAL_LIVES,
            background: "bg_default".to_string(),
            procedural: true,
            prototype,
        }
    }

    /// Fresh copy of the original layout
    pub fn bricks(&self) -> Vec<Brick> {
        self.prototype.clone()
    }

    pub fn prototype(&self) -> &[Brick] {
        &self.prototype
    }

    /// Complete when nothing breakable is left standing
    pub fn is_completed(&self, bricks: &[Brick]) -> bool {
        !bricks.iter().any(Brick::counts_for_clear)
    }
}

/// Ordered levels plus the current position and unlock progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelCatalog {
    levels: Vec<Level>,
    current: usize,
    /// Levels `0..unlocked` may be selected directly
    unlocked: usize,
}

impl LevelCatalog {
    /// Catalog over prebuilt levels; `None` if `levels` is empty
    pub fn from_levels(levels: Vec<Level>) -> Option<Self> {
        if levels.is_empty() {
            return None;
        }
        Some(Self {
            levels,
            current: 0,
            unlocked: 1,
        })
    }

    /// Load every level from `source`, substituting procedural levels for
    /// any that fail to load
    pub fn from_source<R: Rng>(source: &dyn LevelSource, rng: &mut R) -> Self {
        let count = source.level_count();
        let levels: Vec<Level> = if count == 0 {
            log::warn!("Level source is empty, generating {FALLBACK_LEVEL_COUNT} levels");
            (0..FALLBACK_LEVEL_COUNT)
                .map(|i| Level::procedural(i, rng))
                .collect()
        } else {
            (0..count)
                .map(|i| {
                    match source.load(i).and_then(|file| Level::from_file(i, &file)) {
                        Ok(level) => level,
                        Err(e) => {
                            log::warn!("Level {}: {e}; using generated layout", i + 1);
                            Level::procedural(i, rng)
                        }
                    }
                })
                .collect()
        };

        log::info!("Loaded {} levels", levels.len());
        Self {
            levels,
            current: 0,
            unlocked: 1,
        }
    }

    /// The levels shipped with the crate
    pub fn builtin<R: Rng>(rng: &mut R) -> Self {
        Self::from_source(&JsonLevelSource::builtin(), rng)
    }

    pub fn current(&self) -> &Level {
        &self.levels[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.levels.len()
    }

    /// Advance to the next level. Returns false (and stays put) at the end.
    pub fn next_level(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.current += 1;
        self.unlocked = self.unlocked.max(self.current + 1);
        true
    }

    /// Jump to an unlocked level. Returns false for unknown or locked indices.
    pub fn select_level(&mut self, index: usize) -> bool {
        if !self.is_unlocked(index) {
            return false;
        }
        self.current = index;
        true
    }

    pub fn restart_game(&mut self) {
        self.current = 0;
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        index < self.levels.len() && index < self.unlocked
    }

    pub fn unlock_all(&mut self) {
        self.unlocked = self.levels.len();
    }
}
