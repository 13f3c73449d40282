use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Position;

/// Identifies which eaten-item counter a consistency check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Counter {
    Dots,
    Fruits,
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Counter::Dots => f.write_str("dots"),
            Counter::Fruits => f.write_str("fruits"),
        }
    }
}

/// Errors raised while computing a transition.
///
/// These indicate a model-consistency bug (e.g. two items sharing a cell) and
/// are never recoverable inside the engine. The input snapshot is untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("{counter} eaten changed from {before} to {after} in one step; expected a change of 0 or 1")]
    InvalidState {
        counter: Counter,
        before: u32,
        after: u32,
    },
}

/// Represents errors that can occur while assembling a world.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("Actor spawn {0:?} is inside a wall")]
    ActorInWall(Position),
    #[error("Ghost {index} spawn {position:?} is inside a wall")]
    GhostInWall { index: usize, position: Position },
}
