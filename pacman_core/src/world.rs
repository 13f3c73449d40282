use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Item, Move, Position,
    engine::ActionEvent,
    error::WorldError,
    ghost::{GhostPolicy, GhostView, MovementPolicy},
};

/// Lives an actor starts with unless the builder says otherwise.
pub const DEFAULT_LIVES: u32 = 3;

/// The player-controlled actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    position: Position,
    pending_move: Option<Move>,
    lives: u32,
    spawn: Position,
}

impl Actor {
    pub fn new(spawn: Position, lives: u32) -> Self {
        Self {
            position: spawn,
            pending_move: None,
            lives,
            spawn,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn pending_move(&self) -> Option<Move> {
        self.pending_move
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn spawn(&self) -> Position {
        self.spawn
    }

    /// Stages a move to be applied on the next tick.
    pub fn set_move(&mut self, mv: Move) {
        self.pending_move = Some(mv);
    }

    /// Applies the staged move, consuming it.
    ///
    /// Returns `false` if a wall blocks the move, leaving the position unchanged.
    /// Ticking without a staged move is a valid no-op.
    pub fn tick(&mut self, walls: &BTreeSet<Position>) -> bool {
        let Some(mv) = self.pending_move.take() else {
            return true;
        };

        let candidate = self.position.offset(mv);
        if walls.contains(&candidate) {
            return false;
        }
        self.position = candidate;
        true
    }

    /// Lives saturate at zero.
    pub fn lose_life(&mut self, count: u32) {
        self.lives = self.lives.saturating_sub(count);
    }

    /// Returns to the spawn point. Lives are kept.
    pub fn respawn(&mut self) {
        self.position = self.spawn;
        self.pending_move = None;
    }
}

/// An adversary chasing the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ghost {
    position: Position,
    frightened: bool,
    spawn: Position,
    policy: GhostPolicy,
}

impl Ghost {
    pub fn new(spawn: Position, policy: impl Into<GhostPolicy>) -> Self {
        Self {
            position: spawn,
            frightened: false,
            spawn,
            policy: policy.into(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_frightened(&self) -> bool {
        self.frightened
    }

    pub fn spawn(&self) -> Position {
        self.spawn
    }

    pub fn policy(&self) -> &GhostPolicy {
        &self.policy
    }

    /// Hook for the rules that frighten or calm ghosts.
    pub fn set_frightened(&mut self, frightened: bool) {
        self.frightened = frightened;
    }

    /// Lets the movement policy pick this tick's position.
    pub fn tick(&mut self, view: &GhostView<'_>) {
        self.position = self.policy.next_position(view);
    }

    /// Returns to the spawn point and calms down.
    pub fn respawn(&mut self) {
        self.position = self.spawn;
        self.frightened = false;
    }
}

/// Complete state of the world at one tick.
///
/// `Clone` is a deep copy: nothing inside a snapshot is shared with another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub(crate) actor: Actor,
    pub(crate) ghosts: Vec<Ghost>,
    dots: Vec<Position>,
    fruits: Vec<Position>,
    walls: BTreeSet<Position>,
    dots_eaten: u32,
    fruits_eaten: u32,
    pub(crate) last_game_event: ActionEvent,
}

impl WorldSnapshot {
    pub fn builder() -> WorldBuilder {
        WorldBuilder::default()
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn walls(&self) -> &BTreeSet<Position> {
        &self.walls
    }

    pub fn dots(&self) -> &[Position] {
        &self.dots
    }

    pub fn fruits(&self) -> &[Position] {
        &self.fruits
    }

    pub fn dots_eaten_count(&self) -> u32 {
        self.dots_eaten
    }

    pub fn fruits_eaten_count(&self) -> u32 {
        self.fruits_eaten
    }

    pub fn last_game_event(&self) -> ActionEvent {
        self.last_game_event
    }

    pub fn is_wall(&self, position: Position) -> bool {
        self.walls.contains(&position)
    }

    pub fn remaining_items(&self) -> usize {
        self.dots.len() + self.fruits.len()
    }

    /// Returns the item lying at `position`, dots first.
    pub fn item_at(&self, position: Position) -> Option<Item> {
        if self.dots.contains(&position) {
            Some(Item::Dot)
        } else if self.fruits.contains(&position) {
            Some(Item::Fruit)
        } else {
            None
        }
    }

    pub fn is_out_of_lives(&self) -> bool {
        self.actor.lives == 0
    }

    /// Sets the frightened flag on every ghost.
    pub fn frighten_ghosts(&mut self, frightened: bool) {
        for ghost in &mut self.ghosts {
            ghost.set_frightened(frightened);
        }
    }

    /// Removes every item under the actor and bumps the matching counters.
    pub(crate) fn consume_items_at_actor(&mut self) {
        let at = self.actor.position;

        let before = self.dots.len();
        self.dots.retain(|p| *p != at);
        self.dots_eaten += (before - self.dots.len()) as u32;

        let before = self.fruits.len();
        self.fruits.retain(|p| *p != at);
        self.fruits_eaten += (before - self.fruits.len()) as u32;
    }

    /// Advances every ghost in list order; each sees the ones before it already moved.
    pub(crate) fn tick_ghosts(&mut self) {
        let mut positions: Vec<Position> = self.ghosts.iter().map(Ghost::position).collect();

        for (index, ghost) in self.ghosts.iter_mut().enumerate() {
            let view = GhostView {
                index,
                position: ghost.position,
                frightened: ghost.frightened,
                actor: self.actor.position,
                walls: &self.walls,
                ghosts: &positions,
            };
            ghost.tick(&view);
            positions[index] = ghost.position;
        }
    }

    pub(crate) fn respawn_ghosts(&mut self) {
        for ghost in &mut self.ghosts {
            ghost.respawn();
        }
    }

    /// Stages `action` on the actor and applies it against the walls.
    pub(crate) fn tick_actor(&mut self, action: Move) -> bool {
        self.actor.set_move(action);
        self.actor.tick(&self.walls)
    }
}

/// Debug rendering: `#` wall, `P` actor, `G`/`g` ghost (lowercase when
/// frightened), `.` dot, `F` fruit.
impl fmt::Display for WorldSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let all = self
            .walls
            .iter()
            .chain(&self.dots)
            .chain(&self.fruits)
            .chain(std::iter::once(&self.actor.position))
            .chain(self.ghosts.iter().map(|g| &g.position));

        let (mut min_x, mut max_x, mut min_y, mut max_y) = (i32::MAX, i32::MIN, i32::MAX, i32::MIN);
        for p in all {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        // Up is +y, so print the top row first.
        for y in (min_y..=max_y).rev() {
            for x in min_x..=max_x {
                let p = Position::new(x, y);
                let ghost = self.ghosts.iter().find(|g| g.position == p);
                let c = if let Some(ghost) = ghost {
                    if ghost.frightened { 'g' } else { 'G' }
                } else if self.actor.position == p {
                    'P'
                } else if self.walls.contains(&p) {
                    '#'
                } else {
                    match self.item_at(p) {
                        Some(Item::Dot) => '.',
                        Some(Item::Fruit) => 'F',
                        None => ' ',
                    }
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "lives: {} dots: {} fruits: {} event: {:?}",
            self.actor.lives, self.dots_eaten, self.fruits_eaten, self.last_game_event
        )
    }
}

/// Assembles the initial snapshot handed over by a maze loader.
#[derive(Debug, Clone)]
pub struct WorldBuilder {
    walls: BTreeSet<Position>,
    dots: Vec<Position>,
    fruits: Vec<Position>,
    actor_spawn: Position,
    lives: u32,
    ghosts: Vec<Ghost>,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self {
            walls: BTreeSet::new(),
            dots: Vec::new(),
            fruits: Vec::new(),
            actor_spawn: Position::default(),
            lives: DEFAULT_LIVES,
            ghosts: Vec::new(),
        }
    }
}

impl WorldBuilder {
    pub fn wall(mut self, position: Position) -> Self {
        self.walls.insert(position);
        self
    }

    pub fn walls(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.walls.extend(positions);
        self
    }

    /// Items are kept verbatim, duplicates included; the engine reports them
    /// as an inconsistent state when eaten.
    pub fn dot(mut self, position: Position) -> Self {
        self.dots.push(position);
        self
    }

    pub fn dots(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.dots.extend(positions);
        self
    }

    pub fn fruit(mut self, position: Position) -> Self {
        self.fruits.push(position);
        self
    }

    pub fn actor(mut self, spawn: Position) -> Self {
        self.actor_spawn = spawn;
        self
    }

    pub fn lives(mut self, lives: u32) -> Self {
        self.lives = lives;
        self
    }

    /// Appends a ghost; list order is the order ghosts move and collide in.
    pub fn ghost(mut self, spawn: Position, policy: impl Into<GhostPolicy>) -> Self {
        self.ghosts.push(Ghost::new(spawn, policy));
        self
    }

    pub fn frightened_ghost(mut self, spawn: Position, policy: impl Into<GhostPolicy>) -> Self {
        let mut ghost = Ghost::new(spawn, policy);
        ghost.set_frightened(true);
        self.ghosts.push(ghost);
        self
    }

    pub fn build(self) -> Result<WorldSnapshot, WorldError> {
        if self.walls.contains(&self.actor_spawn) {
            return Err(WorldError::ActorInWall(self.actor_spawn));
        }
        if let Some((index, ghost)) = self
            .ghosts
            .iter()
            .enumerate()
            .find(|(_, g)| self.walls.contains(&g.spawn))
        {
            return Err(WorldError::GhostInWall {
                index,
                position: ghost.spawn,
            });
        }

        Ok(WorldSnapshot {
            actor: Actor::new(self.actor_spawn, self.lives),
            ghosts: self.ghosts,
            dots: self.dots,
            fruits: self.fruits,
            walls: self.walls,
            dots_eaten: 0,
            fruits_eaten: 0,
            last_game_event: ActionEvent::None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::{Chaser, Stationary};

    #[test]
    fn actor_blocked_by_wall_keeps_position() {
        let walls = BTreeSet::from([Position::new(2, 3)]);
        let mut actor = Actor::new(Position::new(2, 2), 3);
        actor.set_move(Move::Up);

        assert!(!actor.tick(&walls));
        assert_eq!(actor.position(), Position::new(2, 2));
        assert_eq!(actor.pending_move(), None);
    }

    #[test]
    fn actor_tick_without_move_is_valid() {
        let mut actor = Actor::new(Position::new(0, 0), 3);
        assert!(actor.tick(&BTreeSet::new()));
        assert_eq!(actor.position(), Position::new(0, 0));
    }

    #[test]
    fn lose_life_saturates_and_respawn_keeps_lives() {
        let mut actor = Actor::new(Position::new(1, 1), 1);
        actor.set_move(Move::Right);
        actor.tick(&BTreeSet::new());
        actor.lose_life(2);
        actor.respawn();

        assert_eq!(actor.lives(), 0);
        assert_eq!(actor.position(), Position::new(1, 1));
    }

    #[test]
    fn ghost_respawn_clears_frightened() {
        let mut ghost = Ghost::new(Position::new(4, 4), Stationary);
        ghost.set_frightened(true);
        ghost.respawn();

        assert!(!ghost.is_frightened());
        assert_eq!(ghost.position(), Position::new(4, 4));
    }

    #[test]
    fn builder_rejects_spawns_inside_walls() {
        let err = WorldSnapshot::builder()
            .wall(Position::new(0, 0))
            .actor(Position::new(0, 0))
            .build()
            .unwrap_err();
        assert_eq!(err, WorldError::ActorInWall(Position::new(0, 0)));

        let err = WorldSnapshot::builder()
            .wall(Position::new(3, 3))
            .actor(Position::new(0, 0))
            .ghost(Position::new(1, 1), Chaser)
            .ghost(Position::new(3, 3), Chaser)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            WorldError::GhostInWall {
                index: 1,
                position: Position::new(3, 3)
            }
        );
    }

    #[test]
    fn consuming_counts_every_item_on_the_cell() {
        let mut world = WorldSnapshot::builder()
            .actor(Position::new(0, 0))
            .dots([Position::new(0, 0), Position::new(0, 0), Position::new(5, 5)])
            .fruit(Position::new(0, 0))
            .build()
            .unwrap();

        world.consume_items_at_actor();

        assert_eq!(world.dots_eaten_count(), 2);
        assert_eq!(world.fruits_eaten_count(), 1);
        assert_eq!(world.dots(), &[Position::new(5, 5)]);
        assert_eq!(world.remaining_items(), 1);
    }

    #[test]
    fn later_ghosts_see_earlier_ghosts_moved() {
        // Two chasers in a corridor: the leader steps toward the actor first,
        // which frees its old cell for the follower.
        let mut world = WorldSnapshot::builder()
            .walls((-1..=6).flat_map(|x| [Position::new(x, 1), Position::new(x, -1)]))
            .wall(Position::new(-1, 0))
            .actor(Position::new(5, 0))
            .ghost(Position::new(1, 0), Chaser)
            .ghost(Position::new(0, 0), Chaser)
            .build()
            .unwrap();

        world.tick_ghosts();

        assert_eq!(world.ghosts()[0].position(), Position::new(2, 0));
        assert_eq!(world.ghosts()[1].position(), Position::new(1, 0));
    }

    #[test]
    fn display_marks_entities() {
        let world = WorldSnapshot::builder()
            .walls([Position::new(0, 1), Position::new(1, 1), Position::new(2, 1)])
            .actor(Position::new(0, 0))
            .dot(Position::new(1, 0))
            .frightened_ghost(Position::new(2, 0), Stationary)
            .build()
            .unwrap();

        let rendered = world.to_string();
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some("###"));
        assert_eq!(lines.next(), Some("P.g"));
    }
}
