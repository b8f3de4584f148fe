//! The request surface: obstacle-batch parsing and response assembly.
//!
//! Requests arrive as a single ASCII line, either an obstacle batch
//! (`ALG:<x>,<y>,<dir>,<id>;…;`) or the recognition fallback
//! (`NONE,<obstacle_id>`). Responses carry the wire command strings plus
//! the estimated `(x, y, d)` stream in cell units.

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::{PlanError, Result};
use crate::geometry::{Direction, Position, RobotPose};
use crate::grid::CELL;
use crate::obstacle::Obstacle;
use crate::planner::{PathPlanner, Plan};

/// Fixed robot start pose for wire requests.
pub const START_POSE: RobotPose = RobotPose::new(20, 20, Direction::North);

/// The canned first entry of every response path: the robot's starting
/// cell estimate.
const START_ESTIMATE: PathPoint = PathPoint { x: 1, y: 1, d: 0 };

/// One estimated robot location in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPoint {
    /// Cell column.
    pub x: i32,
    /// Cell row.
    pub y: i32,
    /// Heading index (`N=0, E=1, S=2, W=3`).
    pub d: u8,
}

impl PathPoint {
    fn from_pose(pose: RobotPose) -> Self {
        Self {
            x: pose.x / CELL,
            y: pose.y / CELL,
            d: pose.facing.wire_index(),
        }
    }
}

/// JSON-shaped response for one planning request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResponse {
    /// Wire command strings in execution order.
    pub commands: Vec<String>,
    /// Estimated location after each command, with the leading start
    /// estimate prepended.
    pub path: Vec<PathPoint>,
    /// Number of commands.
    pub total_commands: usize,
}

/// Handle one request line end to end.
///
/// # Errors
///
/// Returns [`PlanError::MalformedRequest`] when the payload matches no
/// known message form, and [`PlanError::MisalignedObstacle`] when a record
/// violates the cell-alignment precondition.
pub fn plan_request(raw: &str) -> Result<PlanResponse> {
    let raw = raw.trim();

    if let Some(body) = raw.strip_prefix("ALG:") {
        let obstacles = parse_obstacle_batch(body)?;
        if obstacles.is_empty() {
            tracing::warn!("No valid obstacle records in batch, returning empty plan");
            return Ok(PlanResponse {
                commands: Vec::new(),
                path: vec![START_ESTIMATE],
                total_commands: 0,
            });
        }

        let planner = PathPlanner::new(obstacles);
        let plan = planner.plan(START_POSE);
        Ok(response_from_plan(&plan))
    } else if let Some(rest) = raw.strip_prefix("NONE,") {
        fallback_response(rest)
    } else {
        Err(PlanError::MalformedRequest(raw.to_string()))
    }
}

/// Parse the record list of an `ALG:` batch.
///
/// Coordinates are cell indices scaled by the cell size on parse.
/// Malformed records (wrong arity, non-integer fields, unknown direction
/// letters) are skipped with a warning; misaligned centres reject the
/// whole request.
pub fn parse_obstacle_batch(body: &str) -> Result<Vec<Obstacle>> {
    let mut records: Vec<&str> = body.split(';').collect();
    // The batch ends with a semicolon; drop the trailing fragment.
    records.pop();

    let mut obstacles = Vec::with_capacity(records.len());
    for record in records {
        let fields: Vec<&str> = record.split(',').collect();
        if fields.len() != 4 {
            tracing::warn!(record, "Skipping malformed obstacle record");
            continue;
        }

        let (Ok(x), Ok(y), Ok(id)) = (
            fields[0].parse::<i32>(),
            fields[1].parse::<i32>(),
            fields[3].parse::<u32>(),
        ) else {
            tracing::warn!(record, "Skipping non-integer obstacle record");
            continue;
        };
        let Some(facing) = Direction::from_wire_letter(fields[2]) else {
            tracing::warn!(record, "Skipping record with unknown direction");
            continue;
        };

        obstacles.push(Obstacle::new(
            Position::new(x * CELL, y * CELL),
            facing,
            id,
        )?);
    }

    Ok(obstacles)
}

/// Encode a single obstacle as one batch record (no trailing semicolon).
#[must_use]
pub fn encode_obstacle_record(obstacle: &Obstacle) -> String {
    format!(
        "{},{},{},{}",
        obstacle.position().x / CELL,
        obstacle.position().y / CELL,
        obstacle.facing(),
        obstacle.index()
    )
}

/// The `NONE,<id>` fallback: back off one cell, scan, return.
fn fallback_response(rest: &str) -> Result<PlanResponse> {
    let id_field = rest.split(',').next().unwrap_or(rest);
    let obstacle: u32 = id_field
        .trim()
        .parse()
        .map_err(|_| PlanError::MalformedRequest(format!("NONE,{rest}")))?;

    let commands = vec![
        Command::Straight { dist: -CELL },
        Command::Scan { obstacle },
        Command::Straight { dist: CELL },
    ];

    let mut pose = START_POSE;
    let mut path = vec![START_ESTIMATE];
    let mut messages = Vec::with_capacity(commands.len());
    for command in commands {
        pose = command.apply(pose);
        messages.push(command.wire_message());
        path.push(PathPoint::from_pose(pose));
    }

    Ok(PlanResponse {
        total_commands: messages.len(),
        commands: messages,
        path,
    })
}

fn response_from_plan(plan: &Plan) -> PlanResponse {
    let mut commands = Vec::with_capacity(plan.commands.len());
    let mut path = Vec::with_capacity(plan.commands.len() + 1);
    path.push(START_ESTIMATE);

    for (command, pose) in plan.pose_trace(START_POSE) {
        commands.push(command.wire_message());
        path.push(PathPoint::from_pose(pose));
    }

    PlanResponse {
        total_commands: commands.len(),
        commands,
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch() {
        let obstacles = parse_obstacle_batch("10,10,E,1;15,5,N,2;").unwrap();
        assert_eq!(obstacles.len(), 2);
        assert_eq!(obstacles[0].position(), Position::new(100, 100));
        assert_eq!(obstacles[0].facing(), Direction::East);
        assert_eq!(obstacles[0].index(), 1);
        assert_eq!(obstacles[1].position(), Position::new(150, 50));
        assert_eq!(obstacles[1].facing(), Direction::North);
        assert_eq!(obstacles[1].index(), 2);
    }

    #[test]
    fn test_parse_skips_malformed_records() {
        // Wrong arity, bad integer, unknown direction; one good record.
        let obstacles =
            parse_obstacle_batch("10,10,E;5,x,N,2;5,5,Q,3;12,8,W,4;").unwrap();
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].index(), 4);
    }

    #[test]
    fn test_record_roundtrip() {
        let obstacle =
            Obstacle::new(Position::new(130, 70), Direction::South, 9).unwrap();
        let record = encode_obstacle_record(&obstacle);
        assert_eq!(record, "13,7,S,9");

        let parsed = parse_obstacle_batch(&format!("{record};")).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].position(), obstacle.position());
        assert_eq!(parsed[0].facing(), obstacle.facing());
        assert_eq!(parsed[0].index(), obstacle.index());
    }

    #[test]
    fn test_empty_batch_gives_empty_plan() {
        let response = plan_request("ALG:").unwrap();
        assert!(response.commands.is_empty());
        assert_eq!(response.path, vec![START_ESTIMATE]);
        assert_eq!(response.total_commands, 0);
    }

    #[test]
    fn test_all_records_malformed_gives_empty_plan() {
        let response = plan_request("ALG:nope;also,nope;").unwrap();
        assert!(response.commands.is_empty());
        assert_eq!(response.total_commands, 0);
    }

    #[test]
    fn test_fallback_triple() {
        let response = plan_request("NONE,7").unwrap();
        assert_eq!(response.commands, vec!["SB010", "SCAN_7", "SF010"]);
        assert_eq!(response.total_commands, 3);
        // Leading start estimate plus one point per command.
        assert_eq!(response.path.len(), 4);
        assert_eq!(response.path[0], START_ESTIMATE);
        assert_eq!(response.path[1], PathPoint { x: 2, y: 1, d: 0 });
        assert_eq!(response.path[3], PathPoint { x: 2, y: 2, d: 0 });
    }

    #[test]
    fn test_unknown_payload_is_rejected() {
        assert!(matches!(
            plan_request("HELLO"),
            Err(PlanError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_single_obstacle_request_end_to_end() {
        let response = plan_request("ALG:10,10,E,1;").unwrap();
        assert_eq!(response.commands.last().unwrap(), "SCAN_1");
        assert_eq!(response.total_commands, response.commands.len());
        assert_eq!(response.path.len(), response.commands.len() + 1);
        assert_eq!(response.path[0], START_ESTIMATE);
        // Final estimate is the target pose of the obstacle, in cells.
        assert_eq!(
            *response.path.last().unwrap(),
            PathPoint { x: 14, y: 10, d: 3 }
        );
    }

    #[test]
    fn test_deterministic_response() {
        let raw = "ALG:5,5,N,1;15,5,W,2;15,15,S,3;";
        let a = plan_request(raw).unwrap();
        let b = plan_request(raw).unwrap();
        assert_eq!(a, b);
    }
}
