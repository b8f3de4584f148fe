//! Geometry primitives: cardinal directions, points, and robot poses.
//!
//! All coordinates are integer world units on a fixed-size square field.
//! Headings take exactly four values, aliased to degrees
//! (`E = 0, N = 90, S = -90, W = 180`).

use serde::{Deserialize, Serialize};

/// One of the four cardinal headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Facing up the grid (+y), 90 degrees.
    North,
    /// Facing right (+x), 0 degrees.
    East,
    /// Facing down the grid (-y), -90 degrees.
    South,
    /// Facing left (-x), 180 degrees.
    West,
}

impl Direction {
    /// All four directions, in wire-index order.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Degree alias of this heading.
    #[must_use]
    pub const fn degrees(self) -> i32 {
        match self {
            Self::North => 90,
            Self::East => 0,
            Self::South => -90,
            Self::West => 180,
        }
    }

    /// Heading after a 180-degree flip.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Unit step of this heading as `(dx, dy)`.
    #[must_use]
    pub const fn unit(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }

    /// True for North/South headings.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    /// Index used by the wire `d` field: `N=0, E=1, S=2, W=3`.
    #[must_use]
    pub const fn wire_index(self) -> u8 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Parse a single-letter direction token from an obstacle batch.
    #[must_use]
    pub fn from_wire_letter(token: &str) -> Option<Self> {
        match token {
            "N" => Some(Self::North),
            "E" => Some(Self::East),
            "S" => Some(Self::South),
            "W" => Some(Self::West),
            _ => None,
        }
    }

    /// Absolute heading difference in degrees, folded to `0..=180`.
    #[must_use]
    pub fn degrees_between(self, other: Self) -> i32 {
        let diff = (self.degrees() - other.degrees()).abs() % 360;
        if diff > 180 {
            360 - diff
        } else {
            diff
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Self::North => "N",
            Self::East => "E",
            Self::South => "S",
            Self::West => "W",
        };
        write!(f, "{letter}")
    }
}

/// A point on the field in integer world units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

impl Position {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Point shifted by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A robot pose: point plus mandatory heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RobotPose {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Facing heading.
    pub facing: Direction,
}

impl RobotPose {
    /// Create a new pose.
    #[must_use]
    pub const fn new(x: i32, y: i32, facing: Direction) -> Self {
        Self { x, y, facing }
    }

    /// The pose's point, heading discarded.
    #[must_use]
    pub const fn position(self) -> Position {
        Position::new(self.x, self.y)
    }
}

impl std::fmt::Display for RobotPose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.facing)
    }
}
