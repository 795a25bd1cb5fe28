//! Session drivers - client-side state around a shared [`Engine`]
//!
//! Both drivers own one engine snapshot and replace it on every step.
//!
//! - [`VersusSession`]: multiplayer client. Pieces and garbage come from the
//!   room server; every lock or elimination must be reported back.
//! - [`SoloGame`]: single player. Pieces come from a local generator and the
//!   tick interval shortens as the score climbs.

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::catalog::Piece;
use crate::engine::{Engine, SettlePolicy};
use crate::types::{
    PieceKind, Shift, SOLO_SCORE_LIMIT_GROWTH, SOLO_START_SCORE_LIMIT, SOLO_START_TICK_MS,
    SOLO_TICK_DECAY,
};

/// Result of one versus step
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing the server needs to hear about
    Continue,
    /// The active piece locked; report the snapshot to receive the next piece
    Locked,
    /// The engine became game over; report the snapshot
    GameOver,
}

impl Outcome {
    pub fn needs_report(&self) -> bool {
        !matches!(self, Outcome::Continue)
    }
}

/// Local state of one player in a multiplayer room
#[derive(Debug, Clone)]
pub struct VersusSession {
    engine: Engine,
    policy: SettlePolicy,
}

impl VersusSession {
    /// Fresh session waiting for its first piece
    pub fn new() -> Self {
        Self::with_policy(SettlePolicy::default())
    }

    pub fn with_policy(policy: SettlePolicy) -> Self {
        Self {
            engine: Engine::new(),
            policy,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn is_over(&self) -> bool {
        self.engine.game_over
    }

    /// True while no piece is falling and the game is still running
    pub fn awaiting_piece(&self) -> bool {
        !self.engine.game_over && self.engine.piece.is_none()
    }

    fn step(&mut self, next: Engine) -> Outcome {
        let outcome = if next.game_over && !self.engine.game_over {
            Outcome::GameOver
        } else if self.engine.piece.is_some() && next.piece.is_none() {
            Outcome::Locked
        } else {
            Outcome::Continue
        };
        self.engine = next;
        outcome
    }

    /// Apply a `newPiece` delivery; ignored while a piece is still falling
    pub fn receive_piece(&mut self, kind: PieceKind) -> Outcome {
        if self.engine.piece.is_some() {
            return Outcome::Continue;
        }
        let next = self.engine.spawn_piece(Piece::spawn(kind));
        self.step(next)
    }

    /// Gravity step
    pub fn tick(&mut self) -> Outcome {
        let next = self.engine.translate_down_with(self.policy);
        self.step(next)
    }

    pub fn shift(&mut self, shift: Shift) -> Outcome {
        let next = self.engine.translate_side_with(shift, self.policy);
        self.step(next)
    }

    pub fn rotate(&mut self) -> Outcome {
        let next = self.engine.rotate();
        self.step(next)
    }

    /// Apply an `add_undestructable_line` delivery
    pub fn receive_garbage(&mut self, lines: u32) -> Outcome {
        let next = self.engine.inject_garbage_lines(lines);
        self.step(next)
    }

    /// Replace the snapshot when the room (re)starts
    pub fn reset(&mut self) {
        self.engine = Engine::new();
    }
}

impl Default for VersusSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Solo difficulty schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacer {
    tick_ms: f64,
    score_limit: f64,
}

impl Pacer {
    pub fn new() -> Self {
        Self {
            tick_ms: f64::from(SOLO_START_TICK_MS),
            score_limit: f64::from(SOLO_START_SCORE_LIMIT),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.round() as u64)
    }

    pub fn score_limit(&self) -> f64 {
        self.score_limit
    }

    /// Raise the threshold and shorten the tick if `score` reached the threshold
    pub fn check(&mut self, score: u32) -> bool {
        if f64::from(score) < self.score_limit {
            return false;
        }
        self.score_limit *= SOLO_SCORE_LIMIT_GROWTH;
        self.tick_ms *= SOLO_TICK_DECAY;
        true
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}

/// What one solo tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoloTick {
    Advanced,
    /// Threshold reached; the tick only adjusted the pace
    SpedUp,
    Paused,
    Over,
}

/// Single-player game with local piece generation
#[derive(Debug, Clone)]
pub struct SoloGame {
    engine: Engine,
    rng: ChaCha8Rng,
    pacer: Pacer,
    paused: bool,
    policy: SettlePolicy,
}

impl SoloGame {
    pub fn new() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(mut rng: ChaCha8Rng) -> Self {
        let engine = Engine::new().spawn_random(&mut rng);
        Self {
            engine,
            rng,
            pacer: Pacer::new(),
            paused: false,
            policy: SettlePolicy::default(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    pub fn tick_interval(&self) -> Duration {
        self.pacer.tick_interval()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// One scheduled step: gravity, then a new piece if the last one locked
    pub fn tick(&mut self) -> SoloTick {
        if self.engine.game_over {
            return SoloTick::Over;
        }
        if self.pacer.check(self.engine.score) {
            return SoloTick::SpedUp;
        }
        if self.paused {
            return SoloTick::Paused;
        }
        self.engine = self
            .engine
            .translate_down_with(self.policy)
            .spawn_random(&mut self.rng);
        if self.engine.game_over {
            SoloTick::Over
        } else {
            SoloTick::Advanced
        }
    }

    pub fn shift(&mut self, shift: Shift) {
        if !self.paused {
            self.engine = self.engine.translate_side_with(shift, self.policy);
        }
    }

    pub fn rotate(&mut self) {
        if !self.paused {
            self.engine = self.engine.rotate();
        }
    }
}

impl Default for SoloGame {
    fn default() -> Self {
        Self::new()
    }
}
