//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data with `serde` derives, so the same values flow
//! through the simulation engine, the room server and the wire protocol
//! without a mapping layer.
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, row 0 at the top)
//!
//! # Cell Values
//!
//! A board cell is a packed 24-bit RGB integer:
//!
//! | Value | Meaning |
//! |-------|---------|
//! | `0` | Empty |
//! | piece color | Occupied by a locked piece |
//! | [`GARBAGE_CELL`] | Indestructible garbage line |
//! | [`OVERLAP_CELL`] | Conflict marker (a lock landed on occupied terrain) |
//!
//! # Scoring
//!
//! Every lock awards [`LOCK_BONUS`] points plus [`LINE_CLEAR_POINTS`] per
//! cleared row. The garbage relay inverts that formula to recover the number
//! of rows cleared from a score delta.
//!
//! # Examples
//!
//! ```
//! use blockfall_types::{PieceKind, Shift, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! assert_eq!(PieceKind::from_str("stick"), Some(PieceKind::Stick));
//! assert_eq!(Shift::Left.dx(), -1);
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

use serde::{Deserialize, Serialize};

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Value of an empty cell
pub const EMPTY_CELL: Cell = 0;

/// Value of a garbage-line cell (light grey)
pub const GARBAGE_CELL: Cell = 0xD9D9D9;

/// Value written when a lock lands on an already occupied, non-garbage cell
pub const OVERLAP_CELL: Cell = 0xB2B2FF;

/// Points awarded per cleared row
pub const LINE_CLEAR_POINTS: u32 = 100;

/// Flat bonus awarded on every lock, whether or not rows were cleared
pub const LOCK_BONUS: u32 = 10;

/// Number of pieces appended to a room's sequence at a time
pub const PIECE_BATCH_SIZE: usize = 100;

/// Default maximum number of players per room
pub const DEFAULT_ROOM_LIMIT: usize = 4;

/// Initial solo tick interval in milliseconds
pub const SOLO_START_TICK_MS: u32 = 500;

/// Initial solo score threshold for the first speed-up
pub const SOLO_START_SCORE_LIMIT: u32 = 500;

/// Factor applied to the solo score threshold after each speed-up
pub const SOLO_SCORE_LIMIT_GROWTH: f64 = 1.8;

/// Factor applied to the solo tick interval after each speed-up
pub const SOLO_TICK_DECAY: f64 = 0.8;

/// A board cell value (see module docs for the encoding)
pub type Cell = u32;

/// The seven piece shapes
///
/// Each shape has a fixed color and a number of rotation states:
/// - **Cube**: 2x2 square, a single state
/// - **Stick**: 4-long bar, 2 states
/// - **S** / **Z**: 2 states each
/// - **L** / **J** / **T**: 4 states each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "cube")]
    Cube,
    #[serde(rename = "stick")]
    Stick,
    L,
    J,
    S,
    Z,
    T,
}

impl PieceKind {
    /// All kinds, in catalog order
    pub const ALL: [PieceKind; 7] = [
        PieceKind::Cube,
        PieceKind::Stick,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::T,
    ];

    /// Parse piece kind from its wire name
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("cube"), Some(PieceKind::Cube));
    /// assert_eq!(PieceKind::from_str("T"), Some(PieceKind::T));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cube" => Some(PieceKind::Cube),
            "stick" => Some(PieceKind::Stick),
            "L" => Some(PieceKind::L),
            "J" => Some(PieceKind::J),
            "S" => Some(PieceKind::S),
            "Z" => Some(PieceKind::Z),
            "T" => Some(PieceKind::T),
            _ => None,
        }
    }

    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::Cube => "cube",
            PieceKind::Stick => "stick",
            PieceKind::L => "L",
            PieceKind::J => "J",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
            PieceKind::T => "T",
        }
    }

    /// Packed RGB color written into the board when this kind locks
    pub fn color(&self) -> Cell {
        match self {
            PieceKind::Cube => 0xFF0000,
            PieceKind::Stick => 0x8B0000,
            PieceKind::L => 0xDC143C,
            PieceKind::J => 0xB22222,
            PieceKind::S => 0xCD5C5C,
            PieceKind::Z => 0xFF6347,
            PieceKind::T => 0xFA8072,
        }
    }

    /// Number of distinct rotation states
    pub fn state_count(&self) -> u8 {
        match self {
            PieceKind::Cube => 1,
            PieceKind::Stick | PieceKind::S | PieceKind::Z => 2,
            PieceKind::L | PieceKind::J | PieceKind::T => 4,
        }
    }
}

/// Absolute board coordinate of one block of a piece
///
/// `y` may be negative while part of a piece sits above the visible board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub x: i8,
    pub y: i8,
}

impl Block {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// Return this block moved by `(dx, dy)`
    #[inline]
    pub fn offset(self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Horizontal move direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    Left,
    Right,
}

impl Shift {
    /// Column delta for this direction
    pub fn dx(&self) -> i8 {
        match self {
            Shift::Left => -1,
            Shift::Right => 1,
        }
    }

    /// Convert a signed direction; only `-1` and `+1` are accepted
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_types::Shift;
    ///
    /// assert_eq!(Shift::from_delta(-1), Some(Shift::Left));
    /// assert_eq!(Shift::from_delta(1), Some(Shift::Right));
    /// assert_eq!(Shift::from_delta(2), None);
    /// ```
    pub fn from_delta(delta: i64) -> Option<Self> {
        match delta {
            -1 => Some(Shift::Left),
            1 => Some(Shift::Right),
            _ => None,
        }
    }
}
