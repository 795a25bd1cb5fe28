//! Engine module - pure state transitions over a player's snapshot
//!
//! An [`Engine`] is the full simulation state of one player: the board, the
//! optional falling piece, the game-over flag and the score. Every operation
//! takes `&self` and returns a new value; nothing is mutated in place, so a
//! snapshot handed to another component (or kept for debugging) never changes
//! underneath it.
//!
//! # Lifecycle
//!
//! ```text
//! no piece --spawn_piece--> active --translate_down hits terrain--> lock + resolve --> no piece
//!     \--spawn blocked--> game over (terminal)
//! ```
//!
//! Garbage injection can also force the lock/resolve path when the raised
//! terrain lands on the falling piece.
//!
//! # Example
//!
//! ```
//! use blockfall_core::{Engine, Piece};
//! use blockfall_core::types::{PieceKind, Shift};
//!
//! let engine = Engine::new().spawn_piece(Piece::spawn(PieceKind::T));
//! let engine = engine.translate_side(Shift::Left).rotate().translate_down();
//! assert!(engine.piece.is_some());
//! assert_eq!(engine.score, 0);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::catalog::Piece;
use crate::sequencer::random_kind;
use crate::types::{Shift, LINE_CLEAR_POINTS, LOCK_BONUS};

/// How a free move updates the piece's `can_rotate` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SettlePolicy {
    /// After the move, probe the next rotation state; if it would not fit,
    /// clear `can_rotate` to signal that the piece is settling.
    #[default]
    RotateProbe,
    /// Every free move re-enables rotation; only direct collisions matter.
    DirectCollision,
}

/// One player's simulation snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Engine {
    #[serde(rename = "current_board")]
    pub board: Board,
    #[serde(rename = "current_piece", default)]
    pub piece: Option<Piece>,
    pub game_over: bool,
    pub score: u32,
}

impl Engine {
    /// Empty board, no piece, zero score
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            piece: None,
            game_over: false,
            score: 0,
        }
    }

    /// Placeholder snapshot for a player that is not in a running game
    pub fn inactive() -> Self {
        Self {
            game_over: true,
            ..Self::new()
        }
    }

    /// True when there is no piece, or every block is on the board over an empty cell
    pub fn can_exist(&self) -> bool {
        self.piece.as_ref().map_or(true, |p| self.fits(p))
    }

    fn fits(&self, piece: &Piece) -> bool {
        piece.blocks.iter().all(|b| self.board.is_valid(b.x, b.y))
    }

    fn with_piece(&self, piece: Option<Piece>) -> Self {
        Self {
            piece,
            ..self.clone()
        }
    }

    /// Place `piece` as the active piece.
    ///
    /// No-op when a piece is already active or the game is over. If the piece
    /// does not fit at its position the result is game over, without a piece.
    pub fn spawn_piece(&self, piece: Piece) -> Self {
        if self.game_over || self.piece.is_some() {
            return self.clone();
        }
        let next = self.with_piece(Some(piece));
        if next.can_exist() {
            next
        } else {
            Self {
                game_over: true,
                ..self.clone()
            }
        }
    }

    /// Spawn a uniformly random piece at its canonical position
    pub fn spawn_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        if self.game_over || self.piece.is_some() {
            return self.clone();
        }
        self.spawn_piece(Piece::spawn(random_kind(rng)))
    }

    /// Move the piece down one row with the default [`SettlePolicy`]
    pub fn translate_down(&self) -> Self {
        self.translate_down_with(SettlePolicy::default())
    }

    /// Move the piece down one row, or lock it and resolve the board when
    /// any block would hit the floor or terrain.
    pub fn translate_down_with(&self, policy: SettlePolicy) -> Self {
        if self.game_over {
            return self.clone();
        }
        let Some(piece) = self.piece else {
            return self.clone();
        };
        let grounded = piece
            .blocks
            .iter()
            .any(|b| self.board.blocks_at(b.x, b.y.saturating_add(1)));
        if grounded {
            return self.lock_piece().resolve_board();
        }
        self.settle(piece.shifted(0, 1), policy)
    }

    /// Move the piece one column with the default [`SettlePolicy`]
    pub fn translate_side(&self, shift: Shift) -> Self {
        self.translate_side_with(shift, SettlePolicy::default())
    }

    /// Move the piece one column; a move into a wall or terrain is a no-op.
    pub fn translate_side_with(&self, shift: Shift, policy: SettlePolicy) -> Self {
        if self.game_over {
            return self.clone();
        }
        let Some(piece) = self.piece else {
            return self.clone();
        };
        let dx = shift.dx();
        if piece
            .blocks
            .iter()
            .any(|b| self.board.blocks_at(b.x.saturating_add(dx), b.y))
        {
            return self.clone();
        }
        self.settle(piece.shifted(dx, 0), policy)
    }

    fn settle(&self, mut moved: Piece, policy: SettlePolicy) -> Self {
        moved.can_rotate = match policy {
            SettlePolicy::RotateProbe => {
                let probe = moved.rotated().unwrap_or(moved);
                self.fits(&probe)
            }
            SettlePolicy::DirectCollision => true,
        };
        self.with_piece(Some(moved))
    }

    /// Advance the piece to its next rotation state.
    ///
    /// No-op while `can_rotate` is false. A rotation that would leave the
    /// board or overlap terrain is rejected and clears `can_rotate`; the cube
    /// never rotates and clears it on the first attempt.
    pub fn rotate(&self) -> Self {
        if self.game_over {
            return self.clone();
        }
        let Some(piece) = self.piece else {
            return self.clone();
        };
        if !piece.can_rotate {
            return self.clone();
        }
        match piece.rotated() {
            Some(candidate) if self.fits(&candidate) => self.with_piece(Some(candidate)),
            _ => self.with_piece(Some(Piece {
                can_rotate: false,
                ..piece
            })),
        }
    }

    /// Merge the active piece into the board and drop it.
    ///
    /// Blocks above the top row are skipped. See [`Board::merge`] for the
    /// per-cell rule.
    pub fn lock_piece(&self) -> Self {
        let Some(piece) = self.piece else {
            return self.clone();
        };
        let mut board = self.board;
        for b in piece.blocks.iter().filter(|b| b.y >= 0) {
            board.merge(b.x, b.y, piece.color);
        }
        Self {
            board,
            piece: None,
            ..self.clone()
        }
    }

    /// Clear full rows and score the lock: `100 * rows + 10`.
    pub fn resolve_board(&self) -> Self {
        let mut board = self.board;
        let cleared = board.clear_full_rows().len() as u32;
        let gained = LINE_CLEAR_POINTS * cleared + LOCK_BONUS;
        Self {
            board,
            score: self.score.saturating_add(gained),
            ..self.clone()
        }
    }

    /// Raise the terrain by `lines` garbage rows.
    ///
    /// When the raised terrain overlaps the falling piece, the piece is locked
    /// into the raised board and the board is resolved.
    pub fn inject_garbage_lines(&self, lines: u32) -> Self {
        if lines == 0 || self.game_over {
            return self.clone();
        }
        let mut board = self.board;
        board.push_garbage_rows(lines as usize);
        let raised = Self {
            board,
            ..self.clone()
        };
        match raised.piece {
            Some(piece)
                if piece
                    .blocks
                    .iter()
                    .any(|b| raised.board.is_occupied(b.x, b.y)) =>
            {
                raised.lock_piece().resolve_board()
            }
            _ => raised,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
