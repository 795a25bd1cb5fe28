//! Catalog module - piece definitions and fixed-offset rotation tables
//!
//! Rotation is a table lookup, not a geometric transform: for each shape and
//! current state there is one row of four `(dx, dy)` deltas, applied to the
//! piece's four blocks in order, that produces the next state. States cycle
//! `1 -> 2 (-> 3 -> 4) -> 1`. There is no wall-kick search; callers validate
//! the candidate position and reject the rotation when it does not fit.

use serde::{Deserialize, Serialize};

use crate::types::{Block, Cell, PieceKind};

/// Four deltas applied to a piece's blocks, in block order
pub type RotationDelta = [(i8, i8); 4];

/// A falling piece with absolute board coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    #[serde(rename = "type")]
    pub kind: PieceKind,
    pub color: Cell,
    /// Rotation state, `1..=kind.state_count()`
    #[serde(rename = "current_shape")]
    pub rotation: u8,
    #[serde(rename = "boxes")]
    pub blocks: [Block; 4],
    /// Cleared once a move or rotation probe hits terrain; set again by the next free move
    pub can_rotate: bool,
}

impl Piece {
    /// Create a piece of `kind` at its canonical spawn position
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            color: kind.color(),
            rotation: 1,
            blocks: spawn_blocks(kind),
            can_rotate: true,
        }
    }

    /// Return this piece with every block moved by `(dx, dy)`
    pub fn shifted(&self, dx: i8, dy: i8) -> Self {
        Self {
            blocks: self.blocks.map(|b| b.offset(dx, dy)),
            ..*self
        }
    }

    /// Candidate piece for the next rotation state, without any validation
    ///
    /// Returns `None` for shapes with a single state (the cube).
    pub fn rotated(&self) -> Option<Self> {
        let (delta, next_state) = rotation_delta(self.kind, self.rotation)?;
        let mut blocks = self.blocks;
        for (block, &(dx, dy)) in blocks.iter_mut().zip(delta.iter()) {
            *block = block.offset(dx, dy);
        }
        Some(Self {
            rotation: next_state,
            blocks,
            ..*self
        })
    }
}

/// Canonical spawn blocks for each shape
pub fn spawn_blocks(kind: PieceKind) -> [Block; 4] {
    let b = Block::new;
    match kind {
        PieceKind::Cube => [b(4, 0), b(5, 0), b(4, 1), b(5, 1)],
        PieceKind::Stick => [b(4, 0), b(4, 1), b(4, 2), b(4, 3)],
        PieceKind::L => [b(4, 0), b(4, 1), b(4, 2), b(5, 2)],
        PieceKind::J => [b(4, 2), b(5, 2), b(5, 1), b(5, 0)],
        PieceKind::S => [b(3, 1), b(4, 1), b(4, 0), b(5, 0)],
        PieceKind::Z => [b(3, 0), b(4, 0), b(4, 1), b(5, 1)],
        PieceKind::T => [b(4, 0), b(3, 1), b(4, 1), b(5, 1)],
    }
}

/// Look up the delta row leaving `state`, together with the state it leads to
///
/// Returns `None` for the cube and for out-of-range states.
pub fn rotation_delta(kind: PieceKind, state: u8) -> Option<(&'static RotationDelta, u8)> {
    let table: &'static [RotationDelta] = match kind {
        PieceKind::Cube => return None,
        PieceKind::Stick => &STICK_DELTAS,
        PieceKind::L => &L_DELTAS,
        PieceKind::J => &J_DELTAS,
        PieceKind::S => &S_DELTAS,
        PieceKind::Z => &Z_DELTAS,
        PieceKind::T => &T_DELTAS,
    };
    let index = usize::from(state).checked_sub(1)?;
    let delta = table.get(index)?;
    let next_state = (state % kind.state_count()) + 1;
    Some((delta, next_state))
}

// Row `n` leaves state `n + 1`.

const STICK_DELTAS: [RotationDelta; 2] = [
    [(-1, 2), (0, 1), (1, 0), (2, -1)],
    [(1, -2), (0, -1), (-1, 0), (-2, 1)],
];

const L_DELTAS: [RotationDelta; 4] = [
    [(1, 1), (0, 0), (-1, -1), (-2, 0)],
    [(-1, 1), (0, 0), (1, -1), (0, -2)],
    [(-1, -1), (0, 0), (1, 1), (2, 0)],
    [(1, -1), (0, 0), (-1, 1), (0, 2)],
];

const J_DELTAS: [RotationDelta; 4] = [
    [(0, -2), (-1, -1), (0, 0), (1, 1)],
    [(2, 0), (1, -1), (0, 0), (-1, 1)],
    [(0, 2), (1, 1), (0, 0), (-1, -1)],
    [(-2, 0), (-1, 1), (0, 0), (1, -1)],
];

const S_DELTAS: [RotationDelta; 2] = [
    [(0, -2), (-1, -1), (0, 0), (-1, 1)],
    [(0, 2), (1, 1), (0, 0), (1, -1)],
];

const Z_DELTAS: [RotationDelta; 2] = [
    [(1, -1), (0, 0), (-1, -1), (-2, 0)],
    [(-1, 1), (0, 0), (1, 1), (2, 0)],
];

const T_DELTAS: [RotationDelta; 4] = [
    [(1, 1), (1, -1), (0, 0), (-1, 1)],
    [(-1, 1), (-1, 1), (0, 0), (1, -1)],
    [(-1, -1), (1, -1), (0, 0), (-1, 1)],
    [(1, -1), (-1, 1), (0, 0), (1, -1)],
];
