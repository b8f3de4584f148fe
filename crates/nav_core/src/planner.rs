//! Plan assembly: tour iteration, per-leg searches, scan markers, and
//! command compression.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::{PlanError, Result};
use crate::geometry::RobotPose;
use crate::grid::Grid;
use crate::obstacle::Obstacle;
use crate::search::{KinematicAStar, SearchVariant};
use crate::tour::{TourConfig, TourSolver};

/// Per-leg attempt budget; each attempt tries both search variants.
pub const MAX_PATH_ATTEMPTS: usize = 3;

/// Plan artefact format version for compatibility.
pub const PLAN_VERSION: u32 = 1;

/// A finished motion plan.
///
/// Carries no references to the grid it was planned on; the command list
/// and the visited-obstacle list are the whole contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Artefact format version.
    pub version: u32,
    /// Commands in execution order, straights already merged.
    pub commands: Vec<Command>,
    /// Indices of obstacles actually reached, in visit order.
    pub visited: Vec<u32>,
    /// Pose after the final command.
    pub final_pose: RobotPose,
}

impl Plan {
    /// Wire message strings in execution order.
    #[must_use]
    pub fn wire_messages(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.wire_message()).collect()
    }

    /// Estimated pose after each command, starting from `start`.
    #[must_use]
    pub fn pose_trace(&self, start: RobotPose) -> Vec<(Command, RobotPose)> {
        let mut pose = start;
        self.commands
            .iter()
            .map(|&command| {
                pose = command.apply(pose);
                (command, pose)
            })
            .collect()
    }

    /// Rough wall-clock estimate for executing the whole plan.
    #[must_use]
    pub fn estimated_duration_secs(&self) -> f64 {
        self.commands.iter().map(|c| c.duration_secs()).sum()
    }

    /// Save the plan artefact to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| PlanError::Artefact(format!("Failed to serialize plan: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| PlanError::Artefact(format!("Failed to write plan file: {e}")))?;
        Ok(())
    }

    /// Load a plan artefact from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or deserialization fails, or the
    /// artefact version does not match.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| PlanError::Artefact(format!("Failed to read plan file: {e}")))?;
        let plan: Self = bincode::deserialize(&bytes)
            .map_err(|e| PlanError::Artefact(format!("Failed to deserialize plan: {e}")))?;

        if plan.version != PLAN_VERSION {
            return Err(PlanError::VersionMismatch {
                expected: PLAN_VERSION,
                found: plan.version,
            });
        }

        Ok(plan)
    }
}

/// The planning pipeline for one obstacle set.
///
/// A pure function of (start pose, obstacle set): no shared mutable state,
/// all per-request temporaries dropped at return.
#[derive(Debug)]
pub struct PathPlanner {
    grid: Grid,
    tour_config: TourConfig,
}

impl PathPlanner {
    /// Build a planner over the given obstacles.
    #[must_use]
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self::with_config(obstacles, TourConfig::default())
    }

    /// Build a planner with explicit tour tuning (tests pin seeds here).
    #[must_use]
    pub fn with_config(obstacles: Vec<Obstacle>, tour_config: TourConfig) -> Self {
        Self {
            grid: Grid::new(obstacles),
            tour_config,
        }
    }

    /// The field this planner searches on.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Produce the full plan from `start`.
    ///
    /// Obstacles whose target cannot be reached are logged and skipped;
    /// the plan stays well-formed and covers the rest.
    #[must_use]
    pub fn plan(&self, start: RobotPose) -> Plan {
        let obstacles = self.grid.obstacles();
        let order =
            TourSolver::new(start, obstacles, self.tour_config.clone()).solve();

        let mut commands: Vec<Command> = Vec::new();
        let mut visited = Vec::new();
        let mut current = start;

        for &idx in &order {
            let obstacle = &obstacles[idx];
            let target = obstacle.target_pose();

            match self.find_leg(current, target) {
                Some((end, leg)) => {
                    tracing::debug!(
                        obstacle = obstacle.index(),
                        commands = leg.len(),
                        "Leg planned"
                    );
                    commands.extend(leg);
                    commands.push(Command::Scan {
                        obstacle: obstacle.index(),
                    });
                    visited.push(obstacle.index());
                    current = end;
                }
                None => {
                    tracing::warn!(
                        obstacle = obstacle.index(),
                        target = %target,
                        "No path to obstacle, skipping"
                    );
                }
            }
        }

        Plan {
            version: PLAN_VERSION,
            commands: compress(commands),
            visited,
            final_pose: current,
        }
    }

    /// Try the attempt ladder for one leg: weighted search first, then the
    /// fallback variant, with relaxed sweep sampling on later attempts.
    fn find_leg(&self, from: RobotPose, to: RobotPose) -> Option<(RobotPose, Vec<Command>)> {
        for attempt in 0..MAX_PATH_ATTEMPTS {
            for variant in [SearchVariant::Weighted, SearchVariant::Fallback] {
                let relax_sweep = attempt > 0;
                if let Some(result) =
                    KinematicAStar::new(&self.grid, from, to, variant, relax_sweep).run()
                {
                    return Some(result);
                }
            }
        }
        None
    }
}

/// Merge consecutive straight commands into single commands.
///
/// Pairs that cancel to zero distance are dropped entirely. Scans and
/// turns are never merged. Idempotent.
#[must_use]
pub fn compress(commands: Vec<Command>) -> Vec<Command> {
    let mut out = Vec::with_capacity(commands.len());
    let mut pending: Option<Command> = None;

    for command in commands {
        match (pending, command) {
            (Some(Command::Straight { dist: a }), Command::Straight { dist: b }) => {
                pending = Some(Command::Straight { dist: a + b });
            }
            (Some(prev), next) => {
                push_unless_zero(&mut out, prev);
                pending = Some(next);
            }
            (None, next) => pending = Some(next),
        }
    }
    if let Some(prev) = pending {
        push_unless_zero(&mut out, prev);
    }

    out
}

fn push_unless_zero(out: &mut Vec<Command>, command: Command) {
    if !matches!(command, Command::Straight { dist: 0 }) {
        out.push(command);
    }
}
