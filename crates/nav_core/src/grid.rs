//! The playing field: cell matrix, boundary rules, and the validity model.
//!
//! Validity is evaluated by world coordinate, not cell index: a pose is
//! valid when it lies inside the playable interior (the border ring of one
//! cell is excluded) and its robot footprint clears every obstacle's
//! inflated safety square. The cell matrix is derived from the same
//! predicate once at construction and serves point-to-cell lookups.

use serde::{Deserialize, Serialize};

use crate::geometry::{Position, RobotPose};
use crate::obstacle::Obstacle;

/// Side length of the square field in world units.
pub const GRID_LENGTH: i32 = 200;

/// Side length of one grid cell in world units.
pub const CELL: i32 = 10;

/// Number of cells per field side.
pub const CELLS_PER_SIDE: usize = (GRID_LENGTH / CELL) as usize;

/// Half-width of the inflated square around each obstacle centre.
pub const OBSTACLE_SAFETY_WIDTH: i32 = 10;

/// Occupancy state of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellState {
    /// The robot centre may occupy this cell.
    #[default]
    Free,
    /// Inside an obstacle safety zone or outside the playable interior.
    Blocked,
}

impl CellState {
    /// Returns true if this cell is free.
    #[must_use]
    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }
}

/// One cell of the field, addressed by its lower-left corner point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    /// World point of the cell's lower-left corner.
    pub position: Position,
    /// Occupancy state.
    pub state: CellState,
}

/// The field: an immutable obstacle set plus the derived cell matrix.
///
/// Built once per request. Search runs clone the whole grid so transient
/// annotation never touches the shared instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    obstacles: Vec<Obstacle>,
    /// Row-major cells; row `i` holds world `y = i * CELL`.
    cells: Vec<GridCell>,
}

impl Grid {
    /// Build the field from an obstacle set.
    #[must_use]
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        let mut grid = Self {
            obstacles,
            cells: Vec::with_capacity(CELLS_PER_SIDE * CELLS_PER_SIDE),
        };

        for i in 0..CELLS_PER_SIDE {
            for j in 0..CELLS_PER_SIDE {
                let position = Position::new(j as i32 * CELL, i as i32 * CELL);
                let state = if grid.is_valid_position(position, false) {
                    CellState::Free
                } else {
                    CellState::Blocked
                };
                grid.cells.push(GridCell { position, state });
            }
        }

        grid
    }

    /// The obstacle set this field was built from.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// The cell containing world point `(x, y)`, or `None` out of bounds.
    #[must_use]
    pub fn cell_at(&self, x: i32, y: i32) -> Option<&GridCell> {
        if x < 0 || y < 0 {
            return None;
        }
        let col = (x / CELL) as usize;
        let row = (y / CELL) as usize;
        if col >= CELLS_PER_SIDE || row >= CELLS_PER_SIDE {
            return None;
        }
        Some(&self.cells[row * CELLS_PER_SIDE + col])
    }

    /// Whether a robot centred at `position` stands on valid ground.
    ///
    /// `ignore_obstacles` skips the safety-zone test and checks only the
    /// playable interior; the search uses it to relax swept-volume samples
    /// on retry attempts.
    #[must_use]
    pub fn is_valid_position(&self, position: Position, ignore_obstacles: bool) -> bool {
        if !ignore_obstacles
            && self
                .obstacles
                .iter()
                .any(|o| o.within_safety_zone(position))
        {
            return false;
        }
        self.within_playable_interior(position)
    }

    /// Pose-level convenience over [`Self::is_valid_position`].
    #[must_use]
    pub fn is_valid_pose(&self, pose: RobotPose, ignore_obstacles: bool) -> bool {
        self.is_valid_position(pose.position(), ignore_obstacles)
    }

    /// Interior excludes the one-cell border ring on every side.
    fn within_playable_interior(&self, position: Position) -> bool {
        let min = CELL;
        let max = GRID_LENGTH - CELL;
        position.x >= min && position.x < max && position.y >= min && position.y < max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;

    fn grid_with(obstacles: &[(i32, i32, Direction)]) -> Grid {
        let obstacles = obstacles
            .iter()
            .enumerate()
            .map(|(i, &(x, y, d))| Obstacle::new(Position::new(x, y), d, i as u32).unwrap())
            .collect();
        Grid::new(obstacles)
    }

    #[test]
    fn test_border_ring_is_invalid() {
        let grid = grid_with(&[]);

        assert!(!grid.is_valid_position(Position::new(0, 100), false));
        assert!(!grid.is_valid_position(Position::new(100, 0), false));
        assert!(!grid.is_valid_position(Position::new(190, 100), false));
        assert!(!grid.is_valid_position(Position::new(100, 195), false));

        assert!(grid.is_valid_position(Position::new(10, 10), false));
        assert!(grid.is_valid_position(Position::new(189, 189), false));
    }

    #[test]
    fn test_safety_zone_blocks_positions() {
        let grid = grid_with(&[(100, 100, Direction::North)]);

        assert!(!grid.is_valid_position(Position::new(100, 100), false));
        assert!(!grid.is_valid_position(Position::new(120, 100), false));
        assert!(!grid.is_valid_position(Position::new(80, 80), false));
        assert!(grid.is_valid_position(Position::new(130, 100), false));
        assert!(grid.is_valid_position(Position::new(70, 100), false));
    }

    #[test]
    fn test_ignore_obstacles_checks_bounds_only() {
        let grid = grid_with(&[(100, 100, Direction::North)]);

        assert!(grid.is_valid_position(Position::new(100, 100), true));
        assert!(!grid.is_valid_position(Position::new(0, 100), true));
    }

    #[test]
    fn test_cell_matrix_matches_predicate() {
        let grid = grid_with(&[(50, 50, Direction::East)]);

        // Border cell.
        assert_eq!(grid.cell_at(0, 0).unwrap().state, CellState::Blocked);
        // Inside the obstacle inflation.
        assert_eq!(grid.cell_at(60, 50).unwrap().state, CellState::Blocked);
        // Open interior.
        assert_eq!(grid.cell_at(100, 100).unwrap().state, CellState::Free);
    }

    #[test]
    fn test_cell_at_resolves_interior_points_and_bounds() {
        let grid = grid_with(&[]);

        // Any point inside a cell maps to that cell's corner.
        let cell = grid.cell_at(57, 123).unwrap();
        assert_eq!(cell.position, Position::new(50, 120));

        assert!(grid.cell_at(-1, 0).is_none());
        assert!(grid.cell_at(0, 200).is_none());
        assert!(grid.cell_at(200, 0).is_none());
    }
}
