//! Kinematic A* over the `(x, y, heading)` state lattice.
//!
//! Successors are motion primitives, not grid neighbours: a one-cell
//! straight step in either drive direction, and the four medium 90-degree
//! arcs. The search is *weighted* A* — command weights are folded into the
//! expansion priority on top of the path cost, biasing expansion away from
//! turn-heavy branches. The contract is to terminate with a path whenever
//! one is reachable by the primitives, not to guarantee a global optimum.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::command::{Command, TurnSide, TurnSize};
use crate::geometry::{Position, RobotPose};
use crate::grid::{Grid, CELL};

/// Expansion weight of a straight step.
pub const WEIGHT_STRAIGHT: i64 = 0;
/// Expansion weight of a small turn (reserved slot).
pub const WEIGHT_SMALL_TURN: i64 = 10;
/// Expansion weight of a medium turn.
pub const WEIGHT_MEDIUM_TURN: i64 = 20;
/// Expansion weight of a large turn (reserved slot).
pub const WEIGHT_LARGE_TURN: i64 = 30;

/// Fallback-variant additive turn penalty at successor generation.
const FALLBACK_TURN_COST: i64 = 50;

/// Penalty for re-entering a state already present in the came-from map.
const REVISIT_PENALTY: i64 = 10;

/// Heading mismatch penalty in both heuristics.
const HEADING_PENALTY: f64 = 10.0;

/// Which cost shaping the search uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchVariant {
    /// Primary: Chebyshev grid heuristic, command weight counted in the
    /// path cost and again at the priority stage.
    Weighted,
    /// Fallback: Euclidean heuristic with a heavier turn cost at successor
    /// generation and no extra priority term.
    Fallback,
}

/// Result of a successful search: the goal pose and the command list
/// that reaches it.
pub type SearchResult = (RobotPose, Vec<Command>);

/// Open-set entry. The insertion counter breaks priority ties
/// deterministically in insertion order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    priority: f64,
    counter: u64,
    pose: RobotPose,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for min-heap behaviour.
        match other.priority.total_cmp(&self.priority) {
            Ordering::Equal => other.counter.cmp(&self.counter),
            ord => ord,
        }
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One search run between two poses. Owns a clone of the grid so the
/// shared instance stays untouched.
#[derive(Debug)]
pub struct KinematicAStar {
    grid: Grid,
    start: RobotPose,
    goal: RobotPose,
    variant: SearchVariant,
    relax_sweep: bool,
}

impl KinematicAStar {
    /// Set up a search run.
    ///
    /// `relax_sweep` loosens the swept-volume samples to bounds-only checks
    /// (terminal poses stay strict); the plan assembler enables it on retry
    /// attempts.
    #[must_use]
    pub fn new(
        grid: &Grid,
        start: RobotPose,
        goal: RobotPose,
        variant: SearchVariant,
        relax_sweep: bool,
    ) -> Self {
        Self {
            grid: grid.clone(),
            start,
            goal,
            variant,
            relax_sweep,
        }
    }

    /// Run the search. `None` when the open set empties without reaching
    /// the goal pose in all three coordinates.
    #[must_use]
    pub fn run(&self) -> Option<SearchResult> {
        let mut frontier: BinaryHeap<HeapEntry> = BinaryHeap::new();
        let mut came_from: HashMap<RobotPose, (Option<RobotPose>, Option<Command>)> =
            HashMap::new();
        let mut cost: HashMap<RobotPose, i64> = HashMap::new();
        let mut counter: u64 = 0;

        frontier.push(HeapEntry {
            priority: 0.0,
            counter,
            pose: self.start,
        });
        cost.insert(self.start, 0);
        came_from.insert(self.start, (None, None));

        while let Some(current) = frontier.pop() {
            if current.pose == self.goal {
                return Some((current.pose, extract_commands(&came_from, self.goal)));
            }

            let current_g = cost.get(&current.pose).copied().unwrap_or(i64::MAX);

            for (next, weight, command) in self.successors(current.pose) {
                let revisit = if came_from.contains_key(&next) {
                    REVISIT_PENALTY
                } else {
                    0
                };
                let tentative = current_g + weight + revisit;

                if tentative < cost.get(&next).copied().unwrap_or(i64::MAX) {
                    counter += 1;
                    let priority =
                        tentative as f64 + self.heuristic(next) + self.priority_weight(command);
                    frontier.push(HeapEntry {
                        priority,
                        counter,
                        pose: next,
                    });
                    came_from.insert(next, (Some(current.pose), Some(command)));
                    cost.insert(next, tentative);
                }
            }
        }

        None
    }

    /// Valid successor states with their cost increment and the command
    /// that produces them.
    fn successors(&self, pose: RobotPose) -> Vec<(RobotPose, i64, Command)> {
        let mut out = Vec::with_capacity(6);

        for dist in [CELL, -CELL] {
            let command = Command::Straight { dist };
            if let Some(next) = self.try_command(command, pose) {
                out.push((next, WEIGHT_STRAIGHT, command));
            }
        }

        let turn_cost = match self.variant {
            SearchVariant::Weighted => WEIGHT_MEDIUM_TURN,
            SearchVariant::Fallback => FALLBACK_TURN_COST,
        };
        for (side, reverse) in [
            (TurnSide::Left, false),
            (TurnSide::Left, true),
            (TurnSide::Right, false),
            (TurnSide::Right, true),
        ] {
            let command = Command::medium_turn(side, reverse);
            if let Some(next) = self.try_command(command, pose) {
                out.push((next, turn_cost, command));
            }
        }

        out
    }

    /// Apply `command` and validate the outcome; turns additionally sweep
    /// their arc. Returns the resulting pose, or `None` when anything along
    /// the way is invalid.
    fn try_command(&self, command: Command, pose: RobotPose) -> Option<RobotPose> {
        let next = command.apply(pose);

        if matches!(command, Command::Turn { .. }) {
            if !self.grid.is_valid_pose(next, self.relax_sweep) {
                return None;
            }
            if !self.sweep_clear(pose, next) {
                return None;
            }
        }

        // Terminal pose is always checked strictly.
        if self.grid.is_valid_pose(next, false) {
            Some(next)
        } else {
            None
        }
    }

    /// Swept-volume check for an arc from `from` to `to`.
    ///
    /// The arc stays inside the L-shaped region whose elbow lies along the
    /// entry heading: vertical headings pass through `(from.x, to.y)`,
    /// horizontal ones through `(to.x, from.y)`. Two sample chains cover
    /// the region, one cell apart, both endpoints excluded (they are
    /// checked separately).
    fn sweep_clear(&self, from: RobotPose, to: RobotPose) -> bool {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let (sx, sy) = (dx.signum(), dy.signum());
        let steps_x = dx.abs() / CELL;
        let steps_y = dy.abs() / CELL;

        let mut samples = Vec::with_capacity((steps_x + steps_y) as usize);
        if from.facing.is_vertical() {
            for k in 1..=steps_y {
                samples.push(Position::new(from.x, from.y + k * sy * CELL));
            }
            for k in 1..=steps_x {
                samples.push(Position::new(to.x - k * sx * CELL, to.y));
            }
        } else {
            for k in 1..=steps_x {
                samples.push(Position::new(from.x + k * sx * CELL, from.y));
            }
            for k in 1..=steps_y {
                samples.push(Position::new(to.x, to.y - k * sy * CELL));
            }
        }

        samples
            .into_iter()
            .all(|p| self.grid.is_valid_position(p, self.relax_sweep))
    }

    /// Estimated remaining cost from `pose` to the goal.
    fn heuristic(&self, pose: RobotPose) -> f64 {
        let heading = if pose.facing == self.goal.facing {
            0.0
        } else {
            HEADING_PENALTY
        };

        let dx = (pose.x - self.goal.x).abs();
        let dy = (pose.y - self.goal.y).abs();
        let distance = match self.variant {
            SearchVariant::Weighted => {
                // Folded Chebyshev distance in cells.
                let diag = dx.min(dy);
                ((diag + (dx - dy).abs()) / CELL) as f64
            }
            SearchVariant::Fallback => f64::from(dx * dx + dy * dy).sqrt(),
        };

        distance + heading
    }

    /// Extra priority term: the primary variant counts the command weight
    /// a second time at the priority stage.
    fn priority_weight(&self, command: Command) -> f64 {
        match self.variant {
            SearchVariant::Weighted => command_weight(command) as f64,
            SearchVariant::Fallback => 0.0,
        }
    }
}

/// Expansion weight of a command by its kind.
#[must_use]
pub fn command_weight(command: Command) -> i64 {
    match command {
        Command::Straight { .. } | Command::Scan { .. } => WEIGHT_STRAIGHT,
        Command::Turn { size, .. } => match size {
            TurnSize::Small => WEIGHT_SMALL_TURN,
            TurnSize::Medium => WEIGHT_MEDIUM_TURN,
            TurnSize::Large => WEIGHT_LARGE_TURN,
        },
    }
}

/// Walk the came-from map back to the root and return the commands in
/// execution order.
fn extract_commands(
    came_from: &HashMap<RobotPose, (Option<RobotPose>, Option<Command>)>,
    goal: RobotPose,
) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut current = Some(goal);

    while let Some(pose) = current {
        let Some(&(parent, command)) = came_from.get(&pose) else {
            break;
        };
        if let Some(c) = command {
            commands.push(c);
        }
        current = parent;
    }

    commands.reverse();
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;
    use crate::obstacle::Obstacle;

    fn empty_grid() -> Grid {
        Grid::new(Vec::new())
    }

    fn grid_with(obstacles: &[(i32, i32, Direction)]) -> Grid {
        let obstacles = obstacles
            .iter()
            .enumerate()
            .map(|(i, &(x, y, d))| Obstacle::new(Position::new(x, y), d, i as u32).unwrap())
            .collect();
        Grid::new(obstacles)
    }

    fn run(grid: &Grid, start: RobotPose, goal: RobotPose) -> Option<SearchResult> {
        KinematicAStar::new(grid, start, goal, SearchVariant::Weighted, false).run()
    }

    /// Replay `commands` from `start` and assert the trace is collision-free
    /// and ends at `goal`.
    fn assert_path_reaches(grid: &Grid, start: RobotPose, goal: RobotPose, commands: &[Command]) {
        let mut pose = start;
        for &c in commands {
            pose = c.apply(pose);
            assert!(
                grid.is_valid_pose(pose, false),
                "invalid intermediate pose {pose} after {c:?}"
            );
        }
        assert_eq!(pose, goal);
    }

    #[test]
    fn test_straight_line_same_heading() {
        let grid = empty_grid();
        let start = RobotPose::new(20, 20, Direction::North);
        let goal = RobotPose::new(20, 60, Direction::North);

        let (end, commands) = run(&grid, start, goal).unwrap();
        assert_eq!(end, goal);
        // Axis-aligned displacement, same heading: exactly |delta|/CELL
        // forward steps and no turns.
        assert_eq!(commands.len(), 4);
        assert!(commands
            .iter()
            .all(|c| matches!(c, Command::Straight { dist: 10 })));
    }

    #[test]
    fn test_straight_line_backward() {
        let grid = empty_grid();
        let start = RobotPose::new(20, 60, Direction::North);
        let goal = RobotPose::new(20, 40, Direction::North);

        let (_, commands) = run(&grid, start, goal).unwrap();
        assert_eq!(commands.len(), 2);
        assert!(commands
            .iter()
            .all(|c| matches!(c, Command::Straight { dist: -10 })));
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = empty_grid();
        let pose = RobotPose::new(50, 50, Direction::East);
        let (end, commands) = run(&grid, pose, pose).unwrap();
        assert_eq!(end, pose);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_single_turn_goal() {
        let grid = empty_grid();
        let start = RobotPose::new(100, 100, Direction::North);
        // Exactly one left-forward medium arc away.
        let goal = RobotPose::new(80, 130, Direction::West);

        let (_, commands) = run(&grid, start, goal).unwrap();
        assert_path_reaches(&grid, start, goal, &commands);
        let turns = commands
            .iter()
            .filter(|c| matches!(c, Command::Turn { .. }))
            .count();
        assert!(turns >= 1);
    }

    #[test]
    fn test_heading_change_requires_turn() {
        let grid = empty_grid();
        let start = RobotPose::new(20, 20, Direction::North);
        let goal = RobotPose::new(140, 100, Direction::West);

        let (end, commands) = run(&grid, start, goal).unwrap();
        assert_eq!(end, goal);
        assert_path_reaches(&grid, start, goal, &commands);
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::Turn { .. })));
    }

    #[test]
    fn test_path_avoids_obstacle() {
        let grid = grid_with(&[(60, 60, Direction::North)]);
        let start = RobotPose::new(20, 60, Direction::East);
        let goal = RobotPose::new(120, 60, Direction::East);

        let (_, commands) = run(&grid, start, goal).unwrap();
        assert_path_reaches(&grid, start, goal, &commands);
    }

    #[test]
    fn test_unreachable_goal_returns_none() {
        let grid = grid_with(&[(100, 100, Direction::North)]);
        let start = RobotPose::new(20, 20, Direction::North);
        // Goal inside the obstacle inflation can never pass the strict
        // terminal check.
        let goal = RobotPose::new(100, 110, Direction::North);

        assert!(run(&grid, start, goal).is_none());
    }

    #[test]
    fn test_fallback_variant_finds_paths_too() {
        let grid = grid_with(&[(60, 60, Direction::North)]);
        let start = RobotPose::new(20, 60, Direction::East);
        let goal = RobotPose::new(120, 60, Direction::East);

        let (_, commands) =
            KinematicAStar::new(&grid, start, goal, SearchVariant::Fallback, false)
                .run()
                .unwrap();
        assert_path_reaches(&grid, start, goal, &commands);
    }

    #[test]
    fn test_turn_rejected_when_sweep_hits_obstacle() {
        // Obstacle sits beside the arc's vertical chain but clear of both
        // endpoints, so only the sweep can reject it.
        let grid = grid_with(&[(40, 70, Direction::North)]);
        let start = RobotPose::new(60, 40, Direction::North);
        let search = KinematicAStar::new(
            &grid,
            start,
            RobotPose::new(120, 120, Direction::East),
            SearchVariant::Weighted,
            false,
        );

        // Right-forward arc from (60,40,N) ends at (80,70,E), which is
        // clear, but the sweep chain along x=60 runs inside the inflation.
        let arc = Command::medium_turn(TurnSide::Right, false);
        assert!(search.try_command(arc, start).is_none());

        // Relaxed sweep lets the samples through; the endpoint is clear.
        let relaxed = KinematicAStar::new(
            &grid,
            start,
            RobotPose::new(120, 120, Direction::East),
            SearchVariant::Weighted,
            true,
        );
        assert!(relaxed.try_command(arc, start).is_some());
    }

    #[test]
    fn test_deterministic_output() {
        let grid = grid_with(&[(60, 60, Direction::North), (120, 100, Direction::West)]);
        let start = RobotPose::new(20, 20, Direction::North);
        let goal = RobotPose::new(160, 140, Direction::South);

        let a = run(&grid, start, goal).unwrap();
        let b = run(&grid, start, goal).unwrap();
        let c = run(&grid, start, goal).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }
}
