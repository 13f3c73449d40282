use serde::{Deserialize, Serialize};

pub mod engine;
pub mod error;
pub mod ghost;
pub mod world;

pub use engine::{ActionEvent, Successors, step, successors, successors_parallel};
pub use error::{Counter, StepError, WorldError};
pub use world::{Actor, DEFAULT_LIVES, Ghost, WorldBuilder, WorldSnapshot};

/// Represents a 2D grid coordinate.
///
/// Coordinates are signed so that move deltas can be applied without
/// overflow checks; bounds are enforced by the walls surrounding a maze.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the position one step away in the direction of `mv`.
    ///
    /// Coordinates wrap at the `i32` limits; mazes are expected to be walled in.
    pub fn offset(self, mv: Move) -> Self {
        let (dx, dy) = mv.delta();
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
        }
    }

    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// One of the four cardinal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All moves, in the order successor sets are enumerated.
    pub const ALL: [Move; 4] = [Move::Up, Move::Left, Move::Down, Move::Right];

    /// Returns the fixed `(dx, dy)` coordinate delta of this move.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Move::Up => (0, 1),
            Move::Down => (0, -1),
            Move::Left => (-1, 0),
            Move::Right => (1, 0),
        }
    }

    pub const fn opposite(self) -> Move {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
            Move::Right => Move::Left,
        }
    }
}

/// Collectible items lying on the maze floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    Dot,
    Fruit,
}
