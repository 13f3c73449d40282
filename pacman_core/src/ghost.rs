use std::collections::BTreeSet;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{Move, Position};

/// Read-only view of the world handed to a ghost's movement policy.
#[derive(Debug, Clone, Copy)]
pub struct GhostView<'a> {
    /// Index of the ghost being advanced within the snapshot's ghost list.
    pub index: usize,
    pub position: Position,
    pub frightened: bool,
    /// Actor position after the actor's move this tick.
    pub actor: Position,
    pub walls: &'a BTreeSet<Position>,
    /// Positions of every ghost. Entries before `index` have already moved this tick.
    pub ghosts: &'a [Position],
}

impl GhostView<'_> {
    pub fn is_wall(&self, position: Position) -> bool {
        self.walls.contains(&position)
    }

    /// True if a ghost other than the one being advanced stands on `position`.
    pub fn is_occupied(&self, position: Position) -> bool {
        self.ghosts
            .iter()
            .enumerate()
            .any(|(i, p)| i != self.index && *p == position)
    }

    /// Neighbouring cells the ghost may step onto, in `Move::ALL` order.
    ///
    /// Cells held by other ghosts are skipped unless nothing else is open.
    pub fn open_neighbours(&self) -> Vec<(Move, Position)> {
        let passable: Vec<(Move, Position)> = Move::ALL
            .iter()
            .map(|mv| (*mv, self.position.offset(*mv)))
            .filter(|(_, p)| !self.is_wall(*p))
            .collect();

        let free: Vec<(Move, Position)> = passable
            .iter()
            .copied()
            .filter(|(_, p)| !self.is_occupied(*p))
            .collect();

        if free.is_empty() { passable } else { free }
    }
}

/// Capability describing how a ghost moves each tick.
///
/// `&mut self` lets a policy keep internal state (heading, tick counters).
pub trait MovementPolicy {
    /// Returns where the ghost should stand after this tick.
    fn next_position(&mut self, view: &GhostView<'_>) -> Position;
}

/// A ghost that never leaves its cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stationary;

impl MovementPolicy for Stationary {
    fn next_position(&mut self, view: &GhostView<'_>) -> Position {
        view.position
    }
}

/// Greedily closes the Manhattan distance to the actor, or opens it while frightened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chaser;

impl MovementPolicy for Chaser {
    fn next_position(&mut self, view: &GhostView<'_>) -> Position {
        let mut best: Option<(u32, Position)> = None;

        for (_, candidate) in view.open_neighbours() {
            let distance = candidate.manhattan_distance(view.actor);
            let better = match best {
                None => true,
                Some((best_distance, _)) if view.frightened => distance > best_distance,
                Some((best_distance, _)) => distance < best_distance,
            };
            if better {
                best = Some((distance, candidate));
            }
        }

        best.map_or(view.position, |(_, p)| p)
    }
}

/// Walks in a straight line, turning around when blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patrol {
    heading: Move,
}

impl Patrol {
    pub fn new(heading: Move) -> Self {
        Self { heading }
    }

    pub fn heading(&self) -> Move {
        self.heading
    }
}

impl MovementPolicy for Patrol {
    fn next_position(&mut self, view: &GhostView<'_>) -> Position {
        let blocked = |p: Position| view.is_wall(p) || view.is_occupied(p);

        let ahead = view.position.offset(self.heading);
        if !blocked(ahead) {
            return ahead;
        }

        self.heading = self.heading.opposite();
        let behind = view.position.offset(self.heading);
        if blocked(behind) { view.position } else { behind }
    }
}

/// Spreads consecutive tick counters across the seed space so walkers with
/// neighbouring seeds do not share shifted streams.
const TICK_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Moves to a random open neighbour.
///
/// The generator is re-seeded from `seed` and the tick counter on every call,
/// so a cloned walker replays exactly the same path as the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomWalker {
    seed: u64,
    ticks: u64,
}

impl RandomWalker {
    pub fn new(seed: u64) -> Self {
        Self { seed, ticks: 0 }
    }
}

impl MovementPolicy for RandomWalker {
    fn next_position(&mut self, view: &GhostView<'_>) -> Position {
        let mut rng = StdRng::seed_from_u64(self.seed ^ self.ticks.wrapping_mul(TICK_MIX));
        self.ticks += 1;

        let options = view.open_neighbours();
        if options.is_empty() {
            return view.position;
        }
        options[rng.random_range(0..options.len())].1
    }
}

/// The closed set of movement policies a ghost can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GhostPolicy {
    Stationary(Stationary),
    Chaser(Chaser),
    Patrol(Patrol),
    Random(RandomWalker),
}

impl Default for GhostPolicy {
    fn default() -> Self {
        GhostPolicy::Stationary(Stationary)
    }
}

impl MovementPolicy for GhostPolicy {
    fn next_position(&mut self, view: &GhostView<'_>) -> Position {
        match self {
            GhostPolicy::Stationary(policy) => policy.next_position(view),
            GhostPolicy::Chaser(policy) => policy.next_position(view),
            GhostPolicy::Patrol(policy) => policy.next_position(view),
            GhostPolicy::Random(policy) => policy.next_position(view),
        }
    }
}

impl From<Stationary> for GhostPolicy {
    fn from(policy: Stationary) -> Self {
        GhostPolicy::Stationary(policy)
    }
}

impl From<Chaser> for GhostPolicy {
    fn from(policy: Chaser) -> Self {
        GhostPolicy::Chaser(policy)
    }
}

impl From<Patrol> for GhostPolicy {
    fn from(policy: Patrol) -> Self {
        GhostPolicy::Patrol(policy)
    }
}

impl From<RandomWalker> for GhostPolicy {
    fn from(policy: RandomWalker) -> Self {
        GhostPolicy::Random(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view<'a>(
        position: Position,
        actor: Position,
        walls: &'a BTreeSet<Position>,
        ghosts: &'a [Position],
    ) -> GhostView<'a> {
        GhostView {
            index: 0,
            position,
            frightened: false,
            actor,
            walls,
            ghosts,
        }
    }

    #[test]
    fn chaser_closes_distance() {
        let walls = BTreeSet::new();
        let ghosts = [Position::new(0, 0)];
        let v = view(Position::new(0, 0), Position::new(3, 0), &walls, &ghosts);

        assert_eq!(Chaser.next_position(&v), Position::new(1, 0));
    }

    #[test]
    fn frightened_chaser_runs_away() {
        let walls = BTreeSet::new();
        let ghosts = [Position::new(0, 0)];
        let mut v = view(Position::new(0, 0), Position::new(3, 0), &walls, &ghosts);
        v.frightened = true;

        // Every other neighbour is four cells away; the first in move order wins.
        assert_eq!(Chaser.next_position(&v), Position::new(0, 1));
    }

    #[test]
    fn chaser_stays_when_boxed_in() {
        let at = Position::new(0, 0);
        let walls: BTreeSet<Position> = Move::ALL.iter().map(|mv| at.offset(*mv)).collect();
        let ghosts = [at];
        let v = view(at, Position::new(5, 5), &walls, &ghosts);

        assert_eq!(Chaser.next_position(&v), at);
    }

    #[test]
    fn patrol_reverses_at_wall() {
        let walls = BTreeSet::from([Position::new(1, 0)]);
        let ghosts = [Position::new(0, 0)];
        let v = view(Position::new(0, 0), Position::new(9, 9), &walls, &ghosts);
        let mut patrol = Patrol::new(Move::Right);

        assert_eq!(patrol.next_position(&v), Position::new(-1, 0));
        assert_eq!(patrol.heading(), Move::Left);
    }

    #[test]
    fn patrol_avoids_other_ghosts() {
        let walls = BTreeSet::new();
        let ghosts = [Position::new(0, 0), Position::new(0, 1)];
        let v = view(Position::new(0, 0), Position::new(9, 9), &walls, &ghosts);
        let mut patrol = Patrol::new(Move::Up);

        assert_eq!(patrol.next_position(&v), Position::new(0, -1));
    }

    #[test]
    fn random_walker_clones_replay_identically() {
        let walls = BTreeSet::from([Position::new(1, 0)]);
        let ghosts = [Position::new(0, 0)];
        let v = view(Position::new(0, 0), Position::new(9, 9), &walls, &ghosts);

        let mut original = RandomWalker::new(7);
        let mut copy = original;
        for _ in 0..16 {
            let a = original.next_position(&v);
            let b = copy.next_position(&v);
            assert_eq!(a, b);
            assert_ne!(a, Position::new(1, 0));
            assert_eq!(a.manhattan_distance(v.position), 1);
        }
    }

    #[test]
    fn neighbouring_seeds_do_not_share_streams() {
        let walls = BTreeSet::new();
        let ghosts = [Position::new(0, 0)];
        let v = view(Position::new(0, 0), Position::new(9, 9), &walls, &ghosts);

        let mut one = RandomWalker::new(1);
        one.next_position(&v);
        let mut two = RandomWalker::new(2);

        let shifted: Vec<Position> = (0..32).map(|_| one.next_position(&v)).collect();
        let fresh: Vec<Position> = (0..32).map(|_| two.next_position(&v)).collect();
        assert_ne!(shifted, fresh);
    }

    #[test]
    fn open_neighbours_fall_back_to_occupied_cells() {
        let at = Position::new(0, 0);
        let walls = BTreeSet::from([Position::new(0, 1), Position::new(-1, 0), Position::new(0, -1)]);
        let ghosts = [at, Position::new(1, 0)];
        let v = view(at, Position::new(9, 9), &walls, &ghosts);

        assert_eq!(v.open_neighbours(), vec![(Move::Right, Position::new(1, 0))]);
    }
}
