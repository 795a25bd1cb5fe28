//! Piece sequencer - the shared, append-only stream of piece kinds
//!
//! Every player in a room reads the same sequence through a private cursor,
//! so everybody receives the same pieces in the same order regardless of pace.
//! The sequence only grows, one batch at a time, whenever a cursor reaches
//! its end. Draws are independent and uniform over the seven kinds.
//!
//! A sequencer built with [`PieceSequencer::with_seed`] is reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::{PieceKind, PIECE_BATCH_SIZE};

/// Draw one kind uniformly at random
pub fn random_kind<R: Rng + ?Sized>(rng: &mut R) -> PieceKind {
    PieceKind::ALL[rng.gen_range(0..PieceKind::ALL.len())]
}

/// Append-only piece sequence for one room
#[derive(Debug, Clone)]
pub struct PieceSequencer {
    kinds: Vec<PieceKind>,
    batch: usize,
    rng: ChaCha8Rng,
}

impl PieceSequencer {
    /// Empty sequence with an entropy-seeded generator
    pub fn new(batch: usize) -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy(), batch)
    }

    /// Empty sequence with a deterministic generator
    pub fn with_seed(seed: u64, batch: usize) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed), batch)
    }

    fn from_rng(rng: ChaCha8Rng, batch: usize) -> Self {
        Self {
            kinds: Vec::new(),
            batch: batch.max(1),
            rng,
        }
    }

    /// Number of pieces generated so far
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Batch size used by [`grow`](Self::grow)
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Append one batch of fresh kinds
    pub fn grow(&mut self) {
        let rng = &mut self.rng;
        self.kinds.extend((0..self.batch).map(|_| random_kind(rng)));
    }

    /// Kind at `cursor`, growing the sequence until it is long enough
    pub fn piece_at(&mut self, cursor: usize) -> PieceKind {
        while cursor >= self.kinds.len() {
            self.grow();
        }
        self.kinds[cursor]
    }

    /// Kind at `cursor` if it has already been generated
    pub fn peek(&self, cursor: usize) -> Option<PieceKind> {
        self.kinds.get(cursor).copied()
    }

    /// Everything generated so far, in order
    pub fn kinds(&self) -> &[PieceKind] {
        &self.kinds
    }
}

impl Default for PieceSequencer {
    fn default() -> Self {
        Self::new(PIECE_BATCH_SIZE)
    }
}
