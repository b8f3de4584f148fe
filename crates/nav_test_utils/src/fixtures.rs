//! Test fixtures and helpers.
//!
//! Pre-built obstacle sets and pose builders for consistent testing.

use nav_core::geometry::{Direction, Position, RobotPose};
use nav_core::grid::Grid;
use nav_core::obstacle::Obstacle;

/// The robot's canonical start pose used throughout the tests.
#[must_use]
pub fn start_pose() -> RobotPose {
    RobotPose::new(20, 20, Direction::North)
}

/// Build an obstacle, panicking on misalignment (tests only).
#[must_use]
pub fn obstacle(x: i32, y: i32, facing: Direction, index: u32) -> Obstacle {
    Obstacle::new(Position::new(x, y), facing, index).expect("test obstacle must be cell-aligned")
}

/// Build an obstacle set from `(x, y, facing, index)` tuples.
#[must_use]
pub fn obstacles(specs: &[(i32, i32, Direction, u32)]) -> Vec<Obstacle> {
    specs
        .iter()
        .map(|&(x, y, d, id)| obstacle(x, y, d, id))
        .collect()
}

/// Build a grid straight from `(x, y, facing, index)` tuples.
#[must_use]
pub fn grid(specs: &[(i32, i32, Direction, u32)]) -> Grid {
    Grid::new(obstacles(specs))
}

/// The three-obstacle L layout used by several scenario tests.
#[must_use]
pub fn l_shaped_trio() -> Vec<Obstacle> {
    obstacles(&[
        (50, 50, Direction::North, 1),
        (150, 50, Direction::West, 2),
        (150, 150, Direction::South, 3),
    ])
}

/// An obstacle ringed by four blockers, making its target unreachable.
///
/// The centre obstacle keeps `index`; the blockers face outward and get
/// the next four indices.
#[must_use]
pub fn boxed_in_obstacle(x: i32, y: i32, facing: Direction, index: u32) -> Vec<Obstacle> {
    use Direction::{East, North, South, West};
    vec![
        obstacle(x, y, facing, index),
        obstacle(x - 20, y, West, index + 1),
        obstacle(x + 20, y, East, index + 2),
        obstacle(x, y - 20, South, index + 3),
        obstacle(x, y + 20, North, index + 4),
    ]
}
