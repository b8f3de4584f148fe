//! Determinism testing utilities.
//!
//! The planner promises byte-identical wire output for identical input
//! (given a fixed tour seed). Sources of non-determinism this harness
//! guards against:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The search never iterates its maps; every ordering decision goes
//!   through the priority queue's insertion counter.
//!
//! - **System randomness**: the genetic tour search uses an explicitly
//!   seeded multiply-add RNG, never `rand`.
//!
//! - **Float comparison**: priorities are compared with `total_cmp`, so
//!   ordering is a total order with no NaN surprises.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
}

impl DeterminismResult {
    /// Assert that the runs were deterministic, with a detailed message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Planning is non-deterministic!\n\
                 Runs: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a producer multiple times and verify its hashed output never varies.
pub fn verify_determinism<T, Produce, HashFn>(
    runs: usize,
    produce: Produce,
    hash: HashFn,
) -> DeterminismResult
where
    Produce: Fn() -> T,
    HashFn: Fn(&T) -> u64,
{
    let hashes: Vec<u64> = (0..runs).map(|_| hash(&produce())).collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
    }
}

/// Hash a full wire response (commands plus path stream).
#[must_use]
pub fn hash_response(response: &nav_core::wire::PlanResponse) -> u64 {
    let mut hasher = DefaultHasher::new();
    response.commands.hash(&mut hasher);
    for point in &response.path {
        point.x.hash(&mut hasher);
        point.y.hash(&mut hasher);
        point.d.hash(&mut hasher);
    }
    hasher.finish()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for planner inputs.
pub mod strategies {
    use nav_core::geometry::Direction;
    use proptest::prelude::*;

    /// An aligned obstacle-centre coordinate inside the field.
    pub fn arb_cell_coordinate() -> impl Strategy<Value = i32> {
        (0i32..20).prop_map(|c| c * 10)
    }

    /// Any of the four cardinal directions.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::North),
            Just(Direction::East),
            Just(Direction::South),
            Just(Direction::West),
        ]
    }

    /// One raw batch record as `(cell_x, cell_y, direction, id)`.
    pub fn arb_record() -> impl Strategy<Value = (i32, i32, Direction, u32)> {
        (
            0i32..20,
            0i32..20,
            arb_direction(),
            0u32..100,
        )
    }

    /// A whole `ALG:` batch body with trailing semicolon.
    pub fn arb_batch_body(max_records: usize) -> impl Strategy<Value = String> {
        proptest::collection::vec(arb_record(), 0..max_records).prop_map(|records| {
            let mut body = String::new();
            for (x, y, d, id) in records {
                body.push_str(&format!("{x},{y},{d},{id};"));
            }
            body
        })
    }
}
