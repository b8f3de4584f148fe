//! Visit-order solver: a small Hamiltonian/TSP over obstacle target poses.
//!
//! Costs come from a heading-aware Chebyshev estimate, not from real
//! searches; the tour only has to be good, the kinematic search does the
//! exact work afterwards. Small instances are enumerated exhaustively,
//! larger ones run a seeded genetic search polished by 2-opt.

use crate::geometry::RobotPose;
use crate::grid::{CELL, GRID_LENGTH};
use crate::obstacle::Obstacle;

/// Largest obstacle count enumerated by brute force.
pub const BRUTE_FORCE_LIMIT: usize = 8;

/// Cost of a 90-degree heading difference in the pair estimate.
const HEADING_CHANGE_WEIGHT: f64 = 5.0;

/// Tuning knobs for the genetic search.
#[derive(Debug, Clone)]
pub struct TourConfig {
    /// Individuals per generation.
    pub population: usize,
    /// Number of generations.
    pub generations: usize,
    /// Per-child swap-mutation probability.
    pub mutation_rate: f64,
    /// Starting points tried by the nearest-neighbour seed.
    pub nearest_neighbour_attempts: usize,
    /// Upper bound on 2-opt improvement passes.
    pub two_opt_max_passes: usize,
    /// RNG seed; fixed so identical requests produce identical tours.
    pub seed: u64,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            population: 100,
            generations: 500,
            mutation_rate: 0.02,
            nearest_neighbour_attempts: 5,
            two_opt_max_passes: 100,
            seed: 0x5EED_2079,
        }
    }
}

/// Simple deterministic RNG for the genetic search.
struct TourRng {
    state: u64,
}

impl TourRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5DEE_CE66D).wrapping_add(11);
        self.state
    }

    fn next_f64(&mut self) -> f64 {
        (self.next() % 10_000) as f64 / 10_000.0
    }

    fn next_index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        (self.next() % n as u64) as usize
    }

    /// Two distinct indices below `n`, unsorted.
    fn distinct_pair(&mut self, n: usize) -> (usize, usize) {
        debug_assert!(n >= 2);
        let a = self.next_index(n);
        loop {
            let b = self.next_index(n);
            if b != a {
                return (a, b);
            }
        }
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }
}

/// Solves the visit order for one request.
pub struct TourSolver<'a> {
    obstacles: &'a [Obstacle],
    config: TourConfig,
    /// `start_cost[i]`: start pose to obstacle `i`'s target.
    start_cost: Vec<f64>,
    /// `pair_cost[i][j]`: obstacle `i`'s target to obstacle `j`'s.
    pair_cost: Vec<Vec<f64>>,
}

impl<'a> TourSolver<'a> {
    /// Precompute the estimate matrix for `obstacles` from `start`.
    #[must_use]
    pub fn new(start: RobotPose, obstacles: &'a [Obstacle], config: TourConfig) -> Self {
        let n = obstacles.len();
        let mut start_cost = Vec::with_capacity(n);
        let mut pair_cost = vec![vec![0.0; n]; n];

        for obstacle in obstacles {
            start_cost.push(pair_estimate(start, obstacle.target_pose()));
        }
        for (i, a) in obstacles.iter().enumerate() {
            for (j, b) in obstacles.iter().enumerate() {
                if i != j {
                    pair_cost[i][j] = pair_estimate(a.target_pose(), b.target_pose());
                }
            }
        }

        Self {
            obstacles,
            config,
            start_cost,
            pair_cost,
        }
    }

    /// Compute the visit order as indices into the obstacle slice.
    ///
    /// Falls back to identity order when every candidate tour contains an
    /// unreachable pair.
    #[must_use]
    pub fn solve(&self) -> Vec<usize> {
        let n = self.obstacles.len();
        if n == 0 {
            return Vec::new();
        }

        let order = if n <= BRUTE_FORCE_LIMIT {
            tracing::debug!(obstacles = n, "Tour: exhaustive enumeration");
            self.brute_force()
        } else {
            tracing::debug!(obstacles = n, "Tour: genetic search + 2-opt");
            self.two_opt(self.genetic())
        };

        if self.tour_cost(&order).is_finite() {
            order
        } else {
            tracing::warn!("Tour contains an unreachable pair, using identity order");
            (0..n).collect()
        }
    }

    /// Total estimated cost of a tour, start leg included.
    #[must_use]
    pub fn tour_cost(&self, order: &[usize]) -> f64 {
        let Some(&first) = order.first() else {
            return 0.0;
        };
        let mut total = self.start_cost[first];
        for pair in order.windows(2) {
            total += self.pair_cost[pair[0]][pair[1]];
        }
        total
    }

    /// Lexicographic enumeration of all permutations, first strict
    /// improvement wins.
    fn brute_force(&self) -> Vec<usize> {
        let n = self.obstacles.len();
        let mut best: Vec<usize> = (0..n).collect();
        let mut best_cost = self.tour_cost(&best);

        let mut perm = best.clone();
        while next_permutation(&mut perm) {
            let cost = self.tour_cost(&perm);
            if cost < best_cost {
                best.copy_from_slice(&perm);
                best_cost = cost;
            }
        }

        best
    }

    /// Greedy nearest-neighbour tours from a few starting obstacles; the
    /// cheapest complete one seeds the genetic search.
    fn nearest_neighbour(&self) -> Vec<usize> {
        let n = self.obstacles.len();
        let mut best: Option<Vec<usize>> = None;
        let mut best_cost = f64::INFINITY;

        for start_idx in 0..self.config.nearest_neighbour_attempts.min(n) {
            let mut path = Vec::with_capacity(n);
            let mut visited = vec![false; n];
            path.push(start_idx);
            visited[start_idx] = true;
            let mut current = start_idx;

            while path.len() < n {
                let mut nearest = None;
                let mut nearest_cost = f64::INFINITY;
                for candidate in 0..n {
                    if !visited[candidate] && self.pair_cost[current][candidate] < nearest_cost {
                        nearest_cost = self.pair_cost[current][candidate];
                        nearest = Some(candidate);
                    }
                }
                let Some(next) = nearest else { break };
                path.push(next);
                visited[next] = true;
                current = next;
            }

            if path.len() == n {
                let cost = self.tour_cost(&path);
                if cost < best_cost {
                    best_cost = cost;
                    best = Some(path);
                }
            }
        }

        best.unwrap_or_else(|| (0..n).collect())
    }

    /// Order-crossover genetic search, elitist top-half survival, seeded
    /// with the nearest-neighbour tour so the result never regresses
    /// below it.
    fn genetic(&self) -> Vec<usize> {
        let n = self.obstacles.len();
        if n <= 2 {
            return (0..n).collect();
        }

        let mut rng = TourRng::new(self.config.seed);
        let population = self.config.population;

        let mut individuals: Vec<Vec<usize>> = (0..population)
            .map(|_| {
                let mut tour: Vec<usize> = (0..n).collect();
                rng.shuffle(&mut tour);
                tour
            })
            .collect();
        individuals[0] = self.nearest_neighbour();

        for _ in 0..self.config.generations {
            let mut scored: Vec<(Vec<usize>, f64)> = individuals
                .into_iter()
                .map(|tour| {
                    let fitness = self.fitness(&tour);
                    (tour, fitness)
                })
                .collect();
            // Stable sort: equal fitness keeps insertion order.
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));

            let survivors: Vec<Vec<usize>> = scored
                .into_iter()
                .take(population / 2)
                .map(|(tour, _)| tour)
                .collect();

            let mut next = survivors.clone();
            while next.len() < population {
                let parent1 = &survivors[rng.next_index(survivors.len())];
                let parent2 = &survivors[rng.next_index(survivors.len())];
                let mut child = order_crossover(parent1, parent2, &mut rng);
                if rng.next_f64() < self.config.mutation_rate && child.len() >= 2 {
                    let (i, j) = rng.distinct_pair(child.len());
                    child.swap(i, j);
                }
                next.push(child);
            }
            individuals = next;
        }

        // First individual with maximal fitness wins.
        let mut best = 0;
        let mut best_fitness = self.fitness(&individuals[0]);
        for (i, tour) in individuals.iter().enumerate().skip(1) {
            let fitness = self.fitness(tour);
            if fitness > best_fitness {
                best = i;
                best_fitness = fitness;
            }
        }
        individuals.swap_remove(best)
    }

    fn fitness(&self, tour: &[usize]) -> f64 {
        let cost = self.tour_cost(tour);
        if cost.is_finite() {
            1.0 / (1.0 + cost)
        } else {
            0.0
        }
    }

    /// First-improvement segment reversal until a full pass finds nothing
    /// or the pass cap is hit.
    fn two_opt(&self, tour: Vec<usize>) -> Vec<usize> {
        if tour.len() < 3 {
            return tour;
        }

        let mut best = tour;
        let mut best_cost = self.tour_cost(&best);
        if !best_cost.is_finite() {
            return best;
        }

        let mut passes = 0;
        let mut improved = true;
        while improved && passes < self.config.two_opt_max_passes {
            improved = false;
            passes += 1;

            'scan: for i in 0..best.len() {
                for j in (i + 2)..best.len() {
                    let mut candidate = best.clone();
                    candidate[i..=j].reverse();
                    let cost = self.tour_cost(&candidate);
                    if cost < best_cost {
                        best = candidate;
                        best_cost = cost;
                        improved = true;
                        break 'scan;
                    }
                }
            }
        }

        best
    }
}

/// Heading-aware Chebyshev estimate between two poses.
///
/// Grid distance folds the diagonal (`(min + |dx - dy|) / CELL`), plus 5
/// per 90 degrees of heading difference. Targets outside the playable
/// interior are unreachable by construction.
fn pair_estimate(from: RobotPose, to: RobotPose) -> f64 {
    if !target_in_interior(from) || !target_in_interior(to) {
        return f64::INFINITY;
    }

    let dx = (from.x - to.x).abs();
    let dy = (from.y - to.y).abs();
    let grid_units = (dx.min(dy) + (dx - dy).abs()) / CELL;

    let heading_steps = from.facing.degrees_between(to.facing) / 90;
    f64::from(grid_units) + f64::from(heading_steps) * HEADING_CHANGE_WEIGHT
}

fn target_in_interior(pose: RobotPose) -> bool {
    let min = CELL;
    let max = GRID_LENGTH - CELL;
    pose.x >= min && pose.x < max && pose.y >= min && pose.y < max
}

/// Advance `perm` to its lexicographic successor; false once exhausted.
fn next_permutation(perm: &mut [usize]) -> bool {
    if perm.len() < 2 {
        return false;
    }

    let mut i = perm.len() - 1;
    while i > 0 && perm[i - 1] >= perm[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }

    let mut j = perm.len() - 1;
    while perm[j] <= perm[i - 1] {
        j -= 1;
    }
    perm.swap(i - 1, j);
    perm[i..].reverse();
    true
}

/// Order crossover (OX): copy a parent-1 slice, fill the rest in parent-2
/// order starting after the slice.
fn order_crossover(parent1: &[usize], parent2: &[usize], rng: &mut TourRng) -> Vec<usize> {
    const UNSET: usize = usize::MAX;

    let size = parent1.len();
    if size < 2 {
        return parent1.to_vec();
    }

    let (a, b) = rng.distinct_pair(size);
    let (start, end) = (a.min(b), a.max(b));

    let mut child = vec![UNSET; size];
    child[start..end].copy_from_slice(&parent1[start..end]);

    let mut pointer = end % size;
    for &item in parent2[end..].iter().chain(&parent2[..end]) {
        if !child.contains(&item) {
            while child[pointer] != UNSET {
                pointer = (pointer + 1) % size;
            }
            child[pointer] = item;
        }
    }

    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Direction, Position};

    fn obstacles(specs: &[(i32, i32, Direction)]) -> Vec<Obstacle> {
        specs
            .iter()
            .enumerate()
            .map(|(i, &(x, y, d))| Obstacle::new(Position::new(x, y), d, i as u32 + 1).unwrap())
            .collect()
    }

    fn start() -> RobotPose {
        RobotPose::new(20, 20, Direction::North)
    }

    #[test]
    fn test_pair_estimate_formula() {
        let a = RobotPose::new(20, 20, Direction::North);
        let b = RobotPose::new(50, 90, Direction::South);
        // Chebyshev 70/10 = 7, heading 180 degrees = 10.
        assert_eq!(pair_estimate(a, b), 17.0);

        let c = RobotPose::new(110, 50, Direction::East);
        // Chebyshev 90/10 = 9, heading 90 degrees = 5.
        assert_eq!(pair_estimate(a, c), 14.0);

        // Same pose, same heading: zero.
        assert_eq!(pair_estimate(a, a), 0.0);
    }

    #[test]
    fn test_out_of_interior_target_is_unreachable() {
        let inside = RobotPose::new(50, 50, Direction::North);
        let outside = RobotPose::new(-40, 0, Direction::East);
        assert!(pair_estimate(inside, outside).is_infinite());
        assert!(pair_estimate(outside, inside).is_infinite());
    }

    #[test]
    fn test_next_permutation_is_lexicographic() {
        let mut perm = vec![0, 1, 2];
        let mut seen = vec![perm.clone()];
        while next_permutation(&mut perm) {
            seen.push(perm.clone());
        }
        assert_eq!(
            seen,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 1],
                vec![1, 0, 2],
                vec![1, 2, 0],
                vec![2, 0, 1],
                vec![2, 1, 0],
            ]
        );
    }

    #[test]
    fn test_empty_and_single() {
        let none = obstacles(&[]);
        let solver = TourSolver::new(start(), &none, TourConfig::default());
        assert!(solver.solve().is_empty());

        let one = obstacles(&[(100, 100, Direction::East)]);
        let solver = TourSolver::new(start(), &one, TourConfig::default());
        assert_eq!(solver.solve(), vec![0]);
    }

    #[test]
    fn test_brute_force_picks_cheapest_order() {
        // L-shaped trio; the cheapest order by the estimate is 3, 2, 1.
        let obs = obstacles(&[
            (50, 50, Direction::North),
            (150, 50, Direction::West),
            (150, 150, Direction::South),
        ]);
        let solver = TourSolver::new(start(), &obs, TourConfig::default());
        let order = solver.solve();
        assert_eq!(order, vec![2, 1, 0]);
        assert_eq!(solver.tour_cost(&order), 35.0);
    }

    #[test]
    fn test_brute_force_beats_every_permutation() {
        let obs = obstacles(&[
            (40, 120, Direction::South),
            (160, 40, Direction::West),
            (90, 170, Direction::East),
            (130, 90, Direction::North),
        ]);
        let solver = TourSolver::new(start(), &obs, TourConfig::default());
        let best = solver.solve();
        let best_cost = solver.tour_cost(&best);

        let mut perm: Vec<usize> = (0..obs.len()).collect();
        loop {
            assert!(solver.tour_cost(&perm) >= best_cost);
            if !next_permutation(&mut perm) {
                break;
            }
        }
    }

    #[test]
    fn test_genetic_path_is_no_worse_than_nearest_neighbour() {
        // Eleven obstacles forces the genetic branch.
        let obs = obstacles(&[
            (40, 40, Direction::North),
            (40, 100, Direction::East),
            (40, 160, Direction::South),
            (100, 40, Direction::West),
            (100, 100, Direction::North),
            (100, 160, Direction::East),
            (160, 60, Direction::South),
            (160, 100, Direction::West),
            (160, 140, Direction::North),
            (70, 130, Direction::East),
            (130, 70, Direction::South),
        ]);
        let solver = TourSolver::new(start(), &obs, TourConfig::default());

        let order = solver.solve();
        assert_eq!(order.len(), obs.len());
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..obs.len()).collect::<Vec<_>>());

        assert!(solver.tour_cost(&order) <= solver.tour_cost(&solver.nearest_neighbour()));
    }

    #[test]
    fn test_solver_is_deterministic() {
        let obs = obstacles(&[
            (40, 40, Direction::North),
            (40, 100, Direction::East),
            (40, 160, Direction::South),
            (100, 40, Direction::West),
            (100, 100, Direction::North),
            (100, 160, Direction::East),
            (160, 60, Direction::South),
            (160, 100, Direction::West),
            (160, 140, Direction::North),
            (70, 130, Direction::East),
        ]);

        let a = TourSolver::new(start(), &obs, TourConfig::default()).solve();
        let b = TourSolver::new(start(), &obs, TourConfig::default()).solve();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unreachable_target_falls_back_to_identity() {
        // Corner obstacle facing the wall: its base target is outside the
        // interior, so every tour containing it costs infinity.
        let obs = obstacles(&[
            (100, 100, Direction::North),
            (0, 0, Direction::South),
            (150, 50, Direction::West),
        ]);
        let solver = TourSolver::new(start(), &obs, TourConfig::default());
        assert_eq!(solver.solve(), vec![0, 1, 2]);
    }

    #[test]
    fn test_two_opt_untangles_a_crossing() {
        let obs = obstacles(&[
            (40, 40, Direction::North),
            (160, 140, Direction::North),
            (40, 60, Direction::North),
            (160, 120, Direction::North),
        ]);
        let solver = TourSolver::new(start(), &obs, TourConfig::default());
        // Zig-zag order crosses the field twice; 2-opt must improve it.
        let tangled = vec![0, 1, 2, 3];
        let untangled = solver.two_opt(tangled.clone());
        assert!(solver.tour_cost(&untangled) < solver.tour_cost(&tangled));
    }
}
