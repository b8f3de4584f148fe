//! Scenario files: RON-encoded obstacle layouts for offline planning.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use nav_core::geometry::{Direction, Position, RobotPose};
use nav_core::grid::{CELL, GRID_LENGTH};
use nav_core::obstacle::Obstacle;
use nav_core::planner::{PathPlanner, Plan};

/// Errors raised while loading or validating a scenario file.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// File could not be read.
    #[error("Failed to read scenario '{path}': {message}")]
    Read {
        /// Path to the scenario file.
        path: String,
        /// Error message.
        message: String,
    },

    /// RON payload did not parse.
    #[error("Failed to parse scenario '{path}': {message}")]
    Parse {
        /// Path to the scenario file.
        path: String,
        /// Error message.
        message: String,
    },

    /// Scenario content violates a planner precondition.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// One obstacle entry in a scenario file, in world units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObstacleSpec {
    /// Centre x coordinate.
    pub x: i32,
    /// Centre y coordinate.
    pub y: i32,
    /// Facing direction.
    pub facing: Direction,
    /// Unique identifier.
    pub index: u32,
}

/// A complete planning scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Robot start pose.
    pub start: RobotPose,
    /// Obstacles to visit.
    pub obstacles: Vec<ObstacleSpec>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    /// Returns an error if reading or parsing fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path_str = path.as_ref().display().to_string();
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| ScenarioError::Read {
            path: path_str.clone(),
            message: e.to_string(),
        })?;
        ron::from_str(&text).map_err(|e| ScenarioError::Parse {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Check every planner precondition a file can violate.
    ///
    /// # Errors
    /// Returns the first violation found: misaligned or out-of-field
    /// centres, or duplicate obstacle ids.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut seen = HashSet::new();
        for spec in &self.obstacles {
            if spec.x % CELL != 0 || spec.y % CELL != 0 {
                return Err(ScenarioError::Invalid(format!(
                    "obstacle {} centre ({}, {}) is not cell-aligned",
                    spec.index, spec.x, spec.y
                )));
            }
            if spec.x < 0 || spec.x >= GRID_LENGTH || spec.y < 0 || spec.y >= GRID_LENGTH {
                return Err(ScenarioError::Invalid(format!(
                    "obstacle {} centre ({}, {}) is outside the field",
                    spec.index, spec.x, spec.y
                )));
            }
            if !seen.insert(spec.index) {
                return Err(ScenarioError::Invalid(format!(
                    "duplicate obstacle id {}",
                    spec.index
                )));
            }
        }
        Ok(())
    }

    /// Validate, then run the planner over this scenario.
    ///
    /// # Errors
    /// Returns an error if validation fails.
    pub fn plan(&self) -> Result<Plan, ScenarioError> {
        self.validate()?;
        let obstacles: Vec<Obstacle> = self
            .obstacles
            .iter()
            .map(|spec| Obstacle::new(Position::new(spec.x, spec.y), spec.facing, spec.index))
            .collect::<Result<_, _>>()
            .map_err(|e| ScenarioError::Invalid(e.to_string()))?;

        let planner = PathPlanner::new(obstacles);
        Ok(planner.plan(self.start))
    }
}
