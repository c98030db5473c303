//! Game state: active piece, landscape, score; tick, moves, landing and spawning.

use crate::piece::{Catalog, MASK_SIDE, Piece, Rotation, ShapeId};
use crate::playfield::{Cell, Playfield};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

/// Where new pieces come from.
pub trait PieceSource {
    /// Next shape and starting rotation.
    fn next_piece(&mut self) -> (ShapeId, Rotation);
}

/// Uniform choice over the catalog and the four rotations.
#[derive(Debug, Clone)]
pub struct RandomSource<R = StdRng> {
    rng: R,
}

impl RandomSource<StdRng> {
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self::new(rng)
    }
}

impl<R: Rng> RandomSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> PieceSource for RandomSource<R> {
    fn next_piece(&mut self) -> (ShapeId, Rotation) {
        let shape = ShapeId::ALL[self.rng.gen_range(0..ShapeId::ALL.len())];
        let rotation = Rotation::ALL[self.rng.gen_range(0..Rotation::ALL.len())];
        (shape, rotation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Falling,
    /// A freshly spawned piece did not fit. Nothing moves until [`GameState::restart`].
    GameOver,
}

/// What a tick or an input did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The piece moved or turned.
    Moved,
    /// The move did not fit and was ignored.
    Blocked,
    /// The piece settled; lists rows cleared (clearing order) and whether the next spawn failed.
    Landed { cleared: Vec<i32>, game_over: bool },
    /// Nothing to do (game over).
    Idle,
}

#[derive(Debug)]
pub struct GameState<S = RandomSource> {
    pub playfield: Playfield,
    pub catalog: Catalog,
    pub piece: Piece,
    pub score: u32,
    pub phase: Phase,
    /// Rows cleared by the most recent landing, for the renderer's flash. Taken by the shell.
    pub cleared_rows: Vec<i32>,
    source: S,
}

impl<S> GameState<S> {
    /// Anchor column that centres the 4x4 mask on the board.
    pub fn spawn_column(width: i32) -> i32 {
        width / 2 - 2
    }

    pub fn current_piece(&self) -> (ShapeId, Rotation, Cell) {
        (self.piece.shape, self.piece.rotation, self.piece.pos)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Drain the rows cleared since the last call.
    pub fn take_cleared_rows(&mut self) -> Vec<i32> {
        std::mem::take(&mut self.cleared_rows)
    }
}

impl<S: PieceSource> GameState<S> {
    pub fn new(width: u16, height: u16, catalog: Catalog, mut source: S) -> Self {
        let playfield = Playfield::new(width, height);
        let piece = Self::spawn_piece(&playfield, &mut source);
        let phase = if playfield.fits(&piece) {
            Phase::Falling
        } else {
            Phase::GameOver
        };
        Self {
            playfield,
            catalog,
            piece,
            score: 0,
            phase,
            cleared_rows: Vec::new(),
            source,
        }
    }

    fn spawn_piece(playfield: &Playfield, source: &mut S) -> Piece {
        let (shape, rotation) = source.next_piece();
        let pos = Cell::new(Self::spawn_column(playfield.width), 0);
        debug!(?shape, rotation = rotation.value(), x = pos.x, "spawn");
        Piece::new(shape, rotation, pos)
    }

    /// One scheduled step: fall one row, or land and spawn the next piece.
    pub fn tick(&mut self) -> Outcome {
        if self.is_game_over() {
            return Outcome::Idle;
        }
        let next = self.piece.shifted(0, 1);
        if self.playfield.fits(&next) {
            self.piece = next;
            Outcome::Moved
        } else {
            self.land()
        }
    }

    pub fn move_left(&mut self) -> Outcome {
        self.try_replace(self.piece.shifted(-1, 0))
    }

    pub fn move_right(&mut self) -> Outcome {
        self.try_replace(self.piece.shifted(1, 0))
    }

    /// One row down. Unlike a tick, a blocked move does not land the piece.
    pub fn move_down(&mut self) -> Outcome {
        self.try_replace(self.piece.shifted(0, 1))
    }

    pub fn rotate_cw(&mut self) -> Outcome {
        self.try_replace(self.piece.rotated(self.piece.rotation.cw()))
    }

    pub fn rotate_ccw(&mut self) -> Outcome {
        self.try_replace(self.piece.rotated(self.piece.rotation.ccw()))
    }

    /// Drop straight down as far as the piece fits, then land at once.
    pub fn hard_drop(&mut self) -> Outcome {
        if self.is_game_over() {
            return Outcome::Idle;
        }
        while self.playfield.fits(&self.piece.shifted(0, 1)) {
            self.piece = self.piece.shifted(0, 1);
        }
        self.land()
    }

    /// Start over on an empty board with a zero score.
    pub fn restart(&mut self) {
        self.playfield.clear();
        self.score = 0;
        self.cleared_rows.clear();
        self.spawn_next();
        info!("game restarted");
    }

    fn try_replace(&mut self, candidate: Piece) -> Outcome {
        if self.is_game_over() {
            return Outcome::Idle;
        }
        if self.playfield.fits(&candidate) {
            self.piece = candidate;
            Outcome::Moved
        } else {
            Outcome::Blocked
        }
    }

    fn land(&mut self) -> Outcome {
        self.playfield.merge(&self.piece, &self.catalog);
        let top = self.piece.pos.y;
        let cleared = self.playfield.clear_rows(top..top + MASK_SIDE);
        if !cleared.is_empty() {
            self.score += cleared.len() as u32;
            info!(rows = ?cleared, score = self.score, "rows cleared");
        }
        self.cleared_rows.extend_from_slice(&cleared);
        self.spawn_next();
        Outcome::Landed {
            cleared,
            game_over: self.is_game_over(),
        }
    }

    fn spawn_next(&mut self) {
        self.piece = Self::spawn_piece(&self.playfield, &mut self.source);
        if self.playfield.fits(&self.piece) {
            self.phase = Phase::Falling;
        } else {
            self.phase = Phase::GameOver;
            warn!(score = self.score, "spawned piece does not fit; game over");
        }
    }
}
