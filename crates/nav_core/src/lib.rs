//! # Nav Core
//!
//! Deterministic motion-planning core for a grid-bound Ackermann robot.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (the plan artefact save/load helpers are the single exception)
//! - No system randomness (the tour solver's RNG is explicitly seeded)
//!
//! The pipeline: an obstacle batch becomes a [`grid::Grid`], the
//! [`tour::TourSolver`] orders the visits, the [`search::KinematicAStar`]
//! plans each leg over motion primitives, and the [`planner::PathPlanner`]
//! assembles and compresses the command stream that the wire layer
//! encodes for the motor controller.
//!
//! ## Crate Structure
//!
//! - [`geometry`] - directions, points, poses
//! - [`grid`] - the field and its validity model
//! - [`obstacle`] - obstacles and target poses
//! - [`command`] - motion commands and wire encoding
//! - [`tour`] - visit-order solver
//! - [`search`] - kinematic A* over motion primitives
//! - [`planner`] - plan assembly and the plan artefact
//! - [`wire`] - request parsing and response assembly

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod obstacle;
pub mod planner;
pub mod search;
pub mod tour;
pub mod wire;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::command::{Command, TurnSide, TurnSize};
    pub use crate::error::{PlanError, Result};
    pub use crate::geometry::{Direction, Position, RobotPose};
    pub use crate::grid::{CellState, Grid, CELL, CELLS_PER_SIDE, GRID_LENGTH};
    pub use crate::obstacle::{Obstacle, STANDOFF};
    pub use crate::planner::{compress, PathPlanner, Plan, MAX_PATH_ATTEMPTS};
    pub use crate::search::{KinematicAStar, SearchVariant};
    pub use crate::tour::{TourConfig, TourSolver};
    pub use crate::wire::{plan_request, PathPoint, PlanResponse, START_POSE};
}
