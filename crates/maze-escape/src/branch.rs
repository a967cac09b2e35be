//! Actions and search branches.
//!
//! A branch is an immutable search node: the actions taken so far, where
//! they leave the agent and what they cost. Expanding a branch always
//! produces a new one.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::maze::{Coords, Direction, Grid};
use crate::rotation::Rotation;

/// Cost of turning a region, in cells walked.
pub const ROTATION_COST: u32 = 5;

/// One straight traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    pub direction: Direction,
    pub cells: u32,
    /// The destination cell is a trap that will fire.
    pub trap: bool,
}

impl Step {
    pub fn new(direction: Direction, cells: u32) -> Self {
        Self {
            direction,
            cells,
            trap: false,
        }
    }

    pub fn trap(direction: Direction, cells: u32) -> Self {
        Self {
            direction,
            cells,
            trap: true,
        }
    }

    /// The same traversal once its trap has fired.
    pub fn safe(self) -> Self {
        Self {
            trap: false,
            ..self
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.direction.name(), self.cells)?;
        if self.trap {
            write!(f, " (trap)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Move(Step),
    Rotate(Rotation),
}

impl Action {
    pub fn cost(&self) -> u32 {
        match self {
            Action::Move(step) => step.cells,
            Action::Rotate(_) => ROTATION_COST,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move(step) => write!(f, "move {}", step),
            Action::Rotate(rotation) => write!(f, "rotate {}", rotation),
        }
    }
}

/// A search node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    actions: Vec<Action>,
    position: Coords,
    cost: u32,
}

impl Branch {
    /// The empty plan, standing on `start`.
    pub fn root(start: Coords) -> Self {
        Self {
            actions: Vec::new(),
            position: start,
            cost: 0,
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<Action> {
        self.actions
    }

    pub fn position(&self) -> Coords {
        self.position
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn rotations(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::Rotate(_)))
            .count()
    }

    /// The rotation that ended this plan, if its last action was one.
    pub fn last_rotation(&self) -> Option<Rotation> {
        match self.actions.last() {
            Some(Action::Rotate(rotation)) => Some(*rotation),
            _ => None,
        }
    }

    /// Branch after walking a trap-free step.
    pub fn extended(&self, step: Step) -> Branch {
        debug_assert!(!step.trap, "trap steps go through Branch::triggered");
        let mut actions = self.actions.clone();
        actions.push(Action::Move(step));
        Branch {
            actions,
            position: self.position.offset(step.direction, step.cells),
            cost: self.cost + step.cells,
        }
    }

    /// Branch after turning a region the agent is not standing in.
    pub fn rotated(&self, rotation: Rotation) -> Branch {
        let mut actions = self.actions.clone();
        actions.push(Action::Rotate(rotation));
        Branch {
            actions,
            position: self.position,
            cost: self.cost + ROTATION_COST,
        }
    }

    /// Moves walked since the last trap fired (or since the start), in order.
    ///
    /// These are exactly the moves the agent has to walk again after being
    /// sent back to the start.
    pub fn replay_since_last_trap(&self) -> SmallVec<[Step; 16]> {
        let mut replay: SmallVec<[Step; 16]> = self
            .actions
            .iter()
            .rev()
            .filter_map(|action| match action {
                Action::Move(step) => Some(*step),
                Action::Rotate(_) => None,
            })
            .take_while(|step| !step.trap)
            .collect();
        replay.reverse();
        replay
    }

    /// Resolve a step onto a trap.
    ///
    /// The agent walks `step`, the trap fires and sends it back to the start,
    /// it replays everything since the previous trap and finally repeats
    /// `step` safely. `cleared` is the grid with the trap already removed;
    /// the replay is walked on it and must lead back to this branch's
    /// position, otherwise the trap is a dead end and `None` is returned.
    pub fn triggered(&self, step: Step, cleared: &Grid) -> Option<Branch> {
        debug_assert!(step.trap, "only trap steps are resolved");

        let replay = self.replay_since_last_trap();
        let mut pos = cleared.start();
        for replayed in &replay {
            pos = cleared.walk(pos, *replayed).ok()?;
        }
        if pos != self.position {
            return None;
        }
        let landing = cleared.walk(self.position, step.safe()).ok()?;

        let mut actions = self.actions.clone();
        actions.reserve(replay.len() + 2);
        actions.push(Action::Move(step));
        actions.extend(replay.iter().map(|s| Action::Move(*s)));
        actions.push(Action::Move(step.safe()));

        let replay_cost: u32 = replay.iter().map(|s| s.cells).sum();
        Some(Branch {
            actions,
            position: landing,
            cost: self.cost + replay_cost + 2 * step.cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::tests::layout;
    use crate::regions::RegionId;
    use crate::rotation::RotationSense;

    fn two_trap_corridor() -> Grid {
        layout(&[
            "xxxxxxxxxxxxxxxxx",
            "xsxxxxxxxxxxxxxxx",
            "x xxxxxxxxxxxxxxx",
            "x xxxxxxxxxxxxxxx",
            "x xxxxxxxxxxxxxxx",
            "x  h  h        ex",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
        ])
    }

    fn moves(steps: &[Step]) -> Vec<Action> {
        steps.iter().map(|s| Action::Move(*s)).collect()
    }

    #[test]
    fn test_costs_accumulate() {
        let region = RegionId::new(5).unwrap();
        let branch = Branch::root(Coords::new(1, 1))
            .extended(Step::new(Direction::Right, 4))
            .rotated(Rotation::new(region, RotationSense::Clockwise))
            .extended(Step::new(Direction::Down, 2));

        assert_eq!(branch.cost(), 4 + ROTATION_COST + 2);
        assert_eq!(branch.position(), Coords::new(5, 3));
        assert_eq!(branch.rotations(), 1);
        assert_eq!(branch.last_rotation(), None);
        let cost: u32 = branch.actions().iter().map(Action::cost).sum();
        assert_eq!(cost, branch.cost());
    }

    #[test]
    fn test_trap_as_first_obstacle_repeats_only_the_trigger() {
        let grid = layout(&[
            "xxxxxxxxxxxxxxxxx",
            "xs    h        ex",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
        ]);
        let trigger = Step::trap(Direction::Right, 5);
        let cleared = grid.without_trap(Coords::new(6, 1));

        let resolved = Branch::root(grid.start()).triggered(trigger, &cleared).unwrap();
        assert_eq!(resolved.actions(), moves(&[trigger, trigger.safe()]).as_slice());
        assert_eq!(resolved.position(), Coords::new(6, 1));
        assert_eq!(resolved.cost(), 10);
    }

    #[test]
    fn test_trap_replays_moves_since_start() {
        let grid = two_trap_corridor();
        let down = Step::new(Direction::Down, 4);
        let trigger = Step::trap(Direction::Right, 2);

        let before = Branch::root(grid.start()).extended(down);
        let cleared = grid.without_trap(Coords::new(3, 5));
        let resolved = before.triggered(trigger, &cleared).unwrap();

        assert_eq!(
            resolved.actions(),
            moves(&[down, trigger, down, trigger.safe()]).as_slice()
        );
        assert_eq!(resolved.position(), Coords::new(3, 5));
        // Replayed distance plus the trigger twice.
        assert_eq!(resolved.cost() - before.cost(), 4 + 2 * 2);
    }

    #[test]
    fn test_second_trap_replays_back_to_the_first() {
        let grid = two_trap_corridor();
        let down = Step::new(Direction::Down, 4);
        let first = Step::trap(Direction::Right, 2);
        let second = Step::trap(Direction::Right, 3);

        let cleared_once = grid.without_trap(Coords::new(3, 5));
        let after_first = Branch::root(grid.start())
            .extended(down)
            .triggered(first, &cleared_once)
            .unwrap();
        assert_eq!(
            after_first.replay_since_last_trap().as_slice(),
            &[down, first.safe()]
        );

        let cleared_twice = cleared_once.without_trap(Coords::new(6, 5));
        let after_second = after_first.triggered(second, &cleared_twice).unwrap();
        assert_eq!(
            after_second.actions(),
            moves(&[
                down,
                first,
                down,
                first.safe(),
                second,
                down,
                first.safe(),
                second.safe()
            ])
            .as_slice()
        );
        assert_eq!(after_second.position(), Coords::new(6, 5));
        assert_eq!(after_second.cost() - after_first.cost(), (4 + 2) + 2 * 3);
        assert_eq!(
            after_second.replay_since_last_trap().as_slice(),
            &[down, first.safe(), second.safe()]
        );
    }

    #[test]
    fn test_unwalkable_replay_is_a_dead_end() {
        let grid = two_trap_corridor();
        let before = Branch::root(grid.start()).extended(Step::new(Direction::Down, 4));

        // Same maze, but the column back from the start is now walled off.
        let mut blocked = grid.without_trap(Coords::new(3, 5));
        blocked.set_tile(Coords::new(1, 3), crate::maze::Tile::Wall);

        assert!(before
            .triggered(Step::trap(Direction::Right, 2), &blocked)
            .is_none());
    }
}
