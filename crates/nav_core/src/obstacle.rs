//! Obstacles and the target-pose computer.
//!
//! An obstacle is a cell-aligned point with a facing direction. The robot
//! must stop at a fixed standoff in front of the face and look back at it;
//! obstacles pressed against the field boundary get fixed lateral nudges so
//! the standoff pose stays drivable.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::geometry::{Direction, Position, RobotPose};
use crate::grid::{CELL, GRID_LENGTH, OBSTACLE_SAFETY_WIDTH};

/// Side length of the physical obstacle box.
pub const OBSTACLE_LENGTH: i32 = 10;

/// Extra clearance between the obstacle face and the camera pose.
pub const OBSTACLE_SAFETY_OFFSET: i32 = 30;

/// Distance from the obstacle centre to the scan pose, along the facing axis.
pub const STANDOFF: i32 = OBSTACLE_LENGTH + OBSTACLE_SAFETY_OFFSET;

/// Largest admissible obstacle-centre coordinate.
const EDGE_MAX: i32 = GRID_LENGTH - CELL;

/// An obstacle to be scanned, with its precomputed target pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    position: Position,
    facing: Direction,
    index: u32,
    target: RobotPose,
}

impl Obstacle {
    /// Create an obstacle and compute its target pose.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::MisalignedObstacle`] unless both centre
    /// coordinates are multiples of [`CELL`].
    pub fn new(position: Position, facing: Direction, index: u32) -> Result<Self> {
        if position.x % CELL != 0 || position.y % CELL != 0 {
            return Err(PlanError::MisalignedObstacle {
                x: position.x,
                y: position.y,
            });
        }

        let target = compute_target_pose(position, facing);
        Ok(Self {
            position,
            facing,
            index,
            target,
        })
    }

    /// Obstacle centre.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Direction the scannable face points.
    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Caller-assigned identifier.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Pose the robot must reach to scan this obstacle.
    #[must_use]
    pub const fn target_pose(&self) -> RobotPose {
        self.target
    }

    /// Whether a robot centred at `point` intrudes on this obstacle's
    /// safety zone.
    ///
    /// The robot body spans one cell in every direction, so the centre is
    /// spread into its 3x3 footprint and each footprint point is tested
    /// against the inflated square.
    #[must_use]
    pub fn within_safety_zone(&self, point: Position) -> bool {
        const SPREAD: [i32; 3] = [-CELL, 0, CELL];
        for dx in SPREAD {
            for dy in SPREAD {
                let diff_x = (self.position.x - (point.x + dx)).abs();
                let diff_y = (self.position.y - (point.y + dy)).abs();
                if diff_x < OBSTACLE_SAFETY_WIDTH + 1 && diff_y < OBSTACLE_SAFETY_WIDTH + 1 {
                    return true;
                }
            }
        }
        false
    }
}

/// Standoff pose plus any corner or edge nudge.
fn compute_target_pose(position: Position, facing: Direction) -> RobotPose {
    let (ux, uy) = facing.unit();
    let base = RobotPose::new(
        position.x + STANDOFF * ux,
        position.y + STANDOFF * uy,
        facing.opposite(),
    );

    let nudge = corner_adjustment(position, facing)
        .or_else(|| edge_adjustment(position, facing))
        .unwrap_or((0, 0));

    RobotPose::new(base.x + nudge.0, base.y + nudge.1, base.facing)
}

/// Lateral nudge for obstacles sitting exactly in a field corner.
///
/// Only the facing/corner pairs in the table get an adjustment; a corner
/// obstacle facing the wall keeps the (undrivable) base pose and is later
/// skipped by the tour solver.
fn corner_adjustment(position: Position, facing: Direction) -> Option<(i32, i32)> {
    use Direction::{East, North, South, West};

    match (position.x, position.y) {
        (0, 0) => match facing {
            North => Some((10, 0)),
            East => Some((0, 10)),
            _ => None,
        },
        (0, EDGE_MAX) => match facing {
            South => Some((10, 0)),
            East => Some((0, -10)),
            _ => None,
        },
        (EDGE_MAX, EDGE_MAX) => match facing {
            South => Some((-10, 0)),
            West => Some((0, -10)),
            _ => None,
        },
        (EDGE_MAX, 0) => match facing {
            North => Some((-10, 0)),
            West => Some((0, 10)),
            _ => None,
        },
        _ => None,
    }
}

/// Lateral nudge for obstacles on a field edge (corners excluded).
fn edge_adjustment(position: Position, facing: Direction) -> Option<(i32, i32)> {
    use Direction::{East, North, South, West};

    if position.y == 0 {
        match facing {
            West | East => Some((0, 10)),
            _ => None,
        }
    } else if position.y == EDGE_MAX {
        match facing {
            West | East => Some((0, -10)),
            _ => None,
        }
    } else if position.x == 0 {
        match facing {
            North | South => Some((10, 0)),
            _ => None,
        }
    } else if position.x == EDGE_MAX {
        match facing {
            North | South => Some((-10, 0)),
            _ => None,
        }
    } else {
        None
    }
}
