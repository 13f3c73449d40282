//! The transition engine.
//!
//! [`step`] is the authoritative reducer: it maps a snapshot and a move to the
//! next snapshot plus a classification of what happened. [`successors`]
//! evaluates all four moves against the same snapshot for search policies.
//!
//! A step runs these phases in a fixed order, and later phases overwrite the
//! event chosen by earlier ones:
//!
//! 1. copy the current snapshot
//! 2. move the actor (`Wall` if blocked)
//! 3. eat items on the cell the actor entered (`Dot`, then `Fruit`)
//! 4. advance ghosts in list order
//! 5. resolve collisions in list order (`CapturedFrightenedGhost` / `CapturedByGhost`)

use std::collections::BTreeMap;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::{
    Move,
    error::{Counter, StepError},
    world::WorldSnapshot,
};

/// Classifies the outcome of a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionEvent {
    /// The actor moved, ate nothing and met no ghost.
    #[default]
    None,
    /// The move ran into a wall.
    Wall,
    Dot,
    Fruit,
    /// A hostile ghost caught the actor.
    CapturedByGhost,
    /// The actor caught a frightened ghost.
    CapturedFrightenedGhost,
}

/// Result of evaluating every move from one snapshot.
pub type Successors = BTreeMap<Move, (WorldSnapshot, ActionEvent)>;

/// Computes the snapshot that follows `current` when the actor plays `action`.
///
/// `current` is never modified. On error no next snapshot is produced.
pub fn step(
    current: &WorldSnapshot,
    action: Move,
) -> Result<(WorldSnapshot, ActionEvent), StepError> {
    let mut next = current.clone();
    next.last_game_event = ActionEvent::None;

    tracing::trace!(?action, from = ?current.actor().position(), "stepping");

    if next.tick_actor(action) {
        // Only a cell the actor just entered can hold something to eat.
        next.consume_items_at_actor();
        classify_eaten(current, &mut next)?;
    } else {
        next.last_game_event = ActionEvent::Wall;
    }

    next.tick_ghosts();

    resolve_collisions(&mut next);

    let event = next.last_game_event;
    tracing::trace!(?action, ?event, to = ?next.actor().position(), "stepped");
    Ok((next, event))
}

/// Evaluates all four moves independently against `current`.
///
/// Errors are reported for the first failing move in [`Move::ALL`] order.
pub fn successors(current: &WorldSnapshot) -> Result<Successors, StepError> {
    Move::ALL
        .iter()
        .map(|&mv| step(current, mv).map(|outcome| (mv, outcome)))
        .collect()
}

/// Same as [`successors`], with each move evaluated on its own thread.
pub fn successors_parallel(current: &WorldSnapshot) -> Result<Successors, StepError> {
    let outcomes: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = Move::ALL
            .iter()
            .map(|&mv| (mv, scope.spawn(move || step(current, mv))))
            .collect();

        handles
            .into_iter()
            .map(|(mv, handle)| match handle.join() {
                Ok(outcome) => (mv, outcome),
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    outcomes
        .into_iter()
        .map(|(mv, outcome)| outcome.map(|o| (mv, o)))
        .collect()
}

/// Turns the eaten-counter deltas into an event. Dots take precedence over fruit.
fn classify_eaten(current: &WorldSnapshot, next: &mut WorldSnapshot) -> Result<(), StepError> {
    let dots = eaten_delta(
        Counter::Dots,
        current.dots_eaten_count(),
        next.dots_eaten_count(),
    )?;
    let fruits = eaten_delta(
        Counter::Fruits,
        current.fruits_eaten_count(),
        next.fruits_eaten_count(),
    )?;

    if dots {
        next.last_game_event = ActionEvent::Dot;
    } else if fruits {
        next.last_game_event = ActionEvent::Fruit;
    }
    Ok(())
}

/// Returns whether exactly one item was eaten; anything but 0 or 1 is inconsistent.
fn eaten_delta(counter: Counter, before: u32, after: u32) -> Result<bool, StepError> {
    match after.checked_sub(before) {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        _ => {
            tracing::error!(%counter, before, after, "eaten counter changed by more than one");
            Err(StepError::InvalidState {
                counter,
                before,
                after,
            })
        }
    }
}

/// Checks every ghost, in list order, against the actor's position.
///
/// The last collision processed decides the event.
fn resolve_collisions(next: &mut WorldSnapshot) {
    for index in 0..next.ghosts.len() {
        if next.ghosts[index].position() != next.actor.position() {
            continue;
        }

        if next.ghosts[index].is_frightened() {
            tracing::debug!(ghost = index, "frightened ghost captured");
            next.ghosts[index].respawn();
            next.last_game_event = ActionEvent::CapturedFrightenedGhost;
        } else {
            tracing::debug!(ghost = index, lives = next.actor.lives(), "actor captured");
            next.respawn_ghosts();
            next.actor.lose_life(1);
            next.actor.respawn();
            next.last_game_event = ActionEvent::CapturedByGhost;
        }
    }
}
