//! Discrete motion commands and their wire encoding.
//!
//! Commands are the planner's output vocabulary: straight runs in whole
//! cells, fixed 90-degree arc turns, and per-obstacle scan markers. A
//! command is a pure value; applying one to a pose yields the next pose.

use serde::{Deserialize, Serialize};

use crate::geometry::{Direction, RobotPose};

/// Medium-turn displacement along the entry heading.
pub const MEDIUM_TURN_LONG: i32 = 30;
/// Medium-turn displacement across the entry heading.
pub const MEDIUM_TURN_SHORT: i32 = 20;
/// Reserved small-turn long axis (no primitive emits it yet).
pub const SMALL_TURN_LONG: i32 = 40;
/// Reserved small-turn short axis (no primitive emits it yet).
pub const SMALL_TURN_SHORT: i32 = 10;

/// Straight-run speed used for duration estimates, world units per second.
pub const ROBOT_SPEED_PER_SECOND: f64 = 25.0;
/// Wall-clock estimate for one medium arc.
pub const MEDIUM_TURN_SECS: f64 = 3.0;
/// Wall-clock estimate for one obstacle scan.
pub const SCAN_SECS: f64 = 2.0;

/// Which way the front wheels point during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnSide {
    /// Anticlockwise when driving forward.
    Left,
    /// Clockwise when driving forward.
    Right,
}

/// Turn magnitude. Only `Medium` is emitted by the current primitive set;
/// `Small` and `Large` reserve cost-weight slots for future hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnSize {
    /// Reserved tight arc.
    Small,
    /// The standard 90-degree arc.
    Medium,
    /// Reserved wide arc.
    Large,
}

/// A single motion command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Drive straight by `dist` world units; negative reverses.
    Straight {
        /// Signed distance, a multiple of the cell size.
        dist: i32,
    },
    /// A fixed 90-degree arc.
    Turn {
        /// Arc magnitude.
        size: TurnSize,
        /// Steering side.
        side: TurnSide,
        /// Executed driving backward.
        reverse: bool,
    },
    /// Stop and scan the obstacle with this index.
    Scan {
        /// Obstacle identifier from the request.
        obstacle: u32,
    },
}

impl Command {
    /// Shorthand for the medium arc the planner actually emits.
    #[must_use]
    pub const fn medium_turn(side: TurnSide, reverse: bool) -> Self {
        Self::Turn {
            size: TurnSize::Medium,
            side,
            reverse,
        }
    }

    /// Pose after executing this command from `pose`.
    ///
    /// Scans and turns without a delta-table entry leave the pose unchanged.
    #[must_use]
    pub fn apply(self, pose: RobotPose) -> RobotPose {
        match self {
            Self::Straight { dist } => {
                let (ux, uy) = pose.facing.unit();
                RobotPose::new(pose.x + dist * ux, pose.y + dist * uy, pose.facing)
            }
            Self::Turn {
                size,
                side,
                reverse,
            } => match turn_delta(size, side, reverse, pose.facing) {
                Some((dx, dy, facing)) => RobotPose::new(pose.x + dx, pose.y + dy, facing),
                None => pose,
            },
            Self::Scan { .. } => pose,
        }
    }

    /// Bit-exact message string for the motor controller.
    #[must_use]
    pub fn wire_message(self) -> String {
        match self {
            Self::Straight { dist } => {
                let prefix = if dist < 0 { "SB" } else { "SF" };
                format!("{prefix}{:03}", dist.abs())
            }
            Self::Turn {
                size: TurnSize::Medium,
                side,
                reverse,
            } => {
                let msg = match (side, reverse) {
                    (TurnSide::Left, false) => "FL090",
                    (TurnSide::Left, true) => "LB090",
                    (TurnSide::Right, false) => "FR090",
                    (TurnSide::Right, true) => "RB090",
                };
                msg.to_string()
            }
            Self::Turn { .. } => "UNKNOWN_COMMAND".to_string(),
            Self::Scan { obstacle } => format!("SCAN_{obstacle}"),
        }
    }

    /// Wall-clock estimate for executing this command.
    #[must_use]
    pub fn duration_secs(self) -> f64 {
        match self {
            Self::Straight { dist } => f64::from(dist.abs()) / ROBOT_SPEED_PER_SECOND,
            Self::Turn {
                size: TurnSize::Medium,
                ..
            } => MEDIUM_TURN_SECS,
            Self::Turn { .. } => 0.0,
            Self::Scan { .. } => SCAN_SECS,
        }
    }
}

/// `(dx, dy, new facing)` for an arc entered at `facing`.
///
/// Medium arcs displace 30 along the entry heading and 20 across it
/// (reversed arcs mirror both); only medium entries exist.
fn turn_delta(
    size: TurnSize,
    side: TurnSide,
    reverse: bool,
    facing: Direction,
) -> Option<(i32, i32, Direction)> {
    use Direction::{East, North, South, West};

    if size != TurnSize::Medium {
        return None;
    }

    let delta = match (side, reverse, facing) {
        // Left forward
        (TurnSide::Left, false, North) => (-20, 30, West),
        (TurnSide::Left, false, West) => (-30, -20, South),
        (TurnSide::Left, false, East) => (30, 20, North),
        (TurnSide::Left, false, South) => (20, -30, East),
        // Right forward
        (TurnSide::Right, false, North) => (20, 30, East),
        (TurnSide::Right, false, West) => (-30, 20, North),
        (TurnSide::Right, false, East) => (30, -20, South),
        (TurnSide::Right, false, South) => (-20, -30, West),
        // Left reverse
        (TurnSide::Left, true, North) => (-30, -20, East),
        (TurnSide::Left, true, West) => (20, -30, North),
        (TurnSide::Left, true, East) => (-20, 30, South),
        (TurnSide::Left, true, South) => (30, 20, West),
        // Right reverse
        (TurnSide::Right, true, North) => (30, -20, West),
        (TurnSide::Right, true, West) => (20, 30, South),
        (TurnSide::Right, true, East) => (-20, -30, North),
        (TurnSide::Right, true, South) => (-30, 20, East),
    };
    Some(delta)
}
