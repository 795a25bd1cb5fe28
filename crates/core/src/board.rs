//! Board module - manages the game grid
//!
//! The board is a 10x20 grid of packed cell values stored row by row.
//! Coordinates: (x, y) where x ranges 0..9 (left to right), y ranges 0..19 (top to bottom).
//! Serialized as a nested array of rows, matching the client snapshot format.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::types::{Cell, BOARD_HEIGHT, BOARD_WIDTH, EMPTY_CELL, GARBAGE_CELL, OVERLAP_CELL};

const WIDTH: usize = BOARD_WIDTH as usize;
const HEIGHT: usize = BOARD_HEIGHT as usize;

/// One board row
pub type Row = [Cell; WIDTH];

/// The game board - 20 rows of 10 cells, row 0 at the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    rows: [Row; HEIGHT],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            rows: [[EMPTY_CELL; WIDTH]; HEIGHT],
        }
    }

    /// Create a board from explicit rows
    pub fn from_rows(rows: [Row; HEIGHT]) -> Self {
        Self { rows }
    }

    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<(usize, usize)> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((x as usize, y as usize))
    }

    /// Get width of the board
    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    /// Get height of the board
    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|(x, y)| self.rows[y][x])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some((x, y)) => {
                self.rows[y][x] = cell;
                true
            }
            None => false,
        }
    }

    /// Check if position is within bounds and empty
    pub fn is_valid(&self, x: i8, y: i8) -> bool {
        self.get(x, y) == Some(EMPTY_CELL)
    }

    /// Check if position is within bounds and filled
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(c) if c != EMPTY_CELL)
    }

    /// Check if position is out of bounds
    pub fn is_out_of_bounds(&self, x: i8, y: i8) -> bool {
        Self::index(x, y).is_none()
    }

    /// Check whether a block at (x, y) would hit a wall, the floor or terrain.
    ///
    /// Positions above the top row are open as long as the column exists.
    pub fn blocks_at(&self, x: i8, y: i8) -> bool {
        if x < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
            return true;
        }
        y >= 0 && self.is_occupied(x, y)
    }

    /// Borrow one row
    pub fn row(&self, y: usize) -> Option<&Row> {
        self.rows.get(y)
    }

    /// Borrow all rows, top to bottom
    pub fn rows(&self) -> &[Row; HEIGHT] {
        &self.rows
    }

    /// A row clears when it has no empty cell and no garbage cell
    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .map(|row| row.iter().all(|&c| c != EMPTY_CELL && c != GARBAGE_CELL))
            .unwrap_or(false)
    }

    /// Merge one locked block into the board.
    ///
    /// Empty cells take `color`; garbage stays garbage; anything else becomes
    /// [`OVERLAP_CELL`]. Returns false when (x, y) is off the board.
    pub fn merge(&mut self, x: i8, y: i8, color: Cell) -> bool {
        let Some(current) = self.get(x, y) else {
            return false;
        };
        let merged = match current {
            EMPTY_CELL => color,
            GARBAGE_CELL => GARBAGE_CELL,
            _ => OVERLAP_CELL,
        };
        self.set(x, y, merged)
    }

    /// Remove every full row and drop the rows above into place.
    ///
    /// Returns the indices of the removed rows, bottom to top.
    pub fn clear_full_rows(&mut self) -> ArrayVec<usize, HEIGHT> {
        let mut cleared_rows = ArrayVec::new();
        let mut write_y = HEIGHT;

        // Scan from bottom to top
        for read_y in (0..HEIGHT).rev() {
            if self.is_row_full(read_y) {
                cleared_rows.push(read_y);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    self.rows[write_y] = self.rows[read_y];
                }
            }
        }

        for row in &mut self.rows[..write_y] {
            *row = [EMPTY_CELL; WIDTH];
        }

        cleared_rows
    }

    /// Drop the top `lines` rows and push as many garbage rows in at the bottom.
    ///
    /// `lines` is clamped to the board height.
    pub fn push_garbage_rows(&mut self, lines: usize) {
        let lines = lines.min(HEIGHT);
        if lines == 0 {
            return;
        }
        self.rows.rotate_left(lines);
        for row in &mut self.rows[HEIGHT - lines..] {
            *row = [GARBAGE_CELL; WIDTH];
        }
    }

    /// Check whether any cell holds the given value
    pub fn contains(&self, cell: Cell) -> bool {
        self.rows.iter().any(|row| row.contains(&cell))
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.rows = [[EMPTY_CELL; WIDTH]; HEIGHT];
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
