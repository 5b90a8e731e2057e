//! Route sequencer: nearest-neighbor construction followed by 2-opt improvement.
//!
//! Works on a closed tour that starts and ends at the origin (matrix index 0).
//! Both phases scan candidates in index order and only accept strict
//! improvements, so the same matrix always yields the same order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::matrix::CostMatrix;

/// Fixed ceiling on the number of 2-opt moves applied per run.
pub const MAX_IMPROVEMENTS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerOptions {
    /// Upper bound on applied 2-opt moves. The effective cap is
    /// `min(destinations², max_improvements)`; zero disables improvement.
    pub max_improvements: usize,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            max_improvements: MAX_IMPROVEMENTS,
        }
    }
}

/// A sequenced closed tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    /// Matrix indices of the destinations in visiting order (origin excluded).
    pub order: Vec<usize>,
    /// Sum of leg distances over origin → stops → origin, in meters.
    pub total_distance: i64,
    /// Sum of leg durations over the same legs, in seconds.
    pub total_duration: i64,
}

impl Tour {
    fn empty() -> Self {
        Self {
            order: Vec::new(),
            total_distance: 0,
            total_duration: 0,
        }
    }

    /// Directed `(from, to)` matrix index pairs of every leg, closing back at the origin.
    pub fn legs(&self) -> Vec<(usize, usize)> {
        if self.order.is_empty() {
            return Vec::new();
        }
        std::iter::once(0)
            .chain(self.order.iter().copied())
            .zip(self.order.iter().copied().chain(std::iter::once(0)))
            .collect()
    }
}

/// Orders the destinations of `matrix` (indices `1..n`) to approximately
/// minimize the closed-tour distance from and back to index 0.
///
/// Rejects matrices with non-positive costs between distinct coordinates.
pub fn sequence(matrix: &CostMatrix, options: &SequencerOptions) -> Result<Tour, ProviderError> {
    if matrix.is_empty() {
        return Err(ProviderError::Malformed("matrix has no origin".to_string()));
    }
    matrix.check_entries()?;

    let destinations = matrix.len() - 1;
    if destinations == 0 {
        return Ok(Tour::empty());
    }

    let mut tour = nearest_neighbor(matrix);
    let initial = tour_distance(matrix, &tour);

    let applied = improve(matrix, &mut tour, improvement_cap(destinations, options));

    let order = tour[1..].to_vec();
    let result = Tour {
        total_distance: tour_distance(matrix, &tour),
        total_duration: tour_duration(matrix, &tour),
        order,
    };

    debug!(
        destinations,
        initial_distance = initial,
        final_distance = result.total_distance,
        improvements = applied,
        "sequenced tour"
    );

    Ok(result)
}

/// Greedy tour from the origin: always step to the closest unvisited destination.
///
/// Ties go to the lowest matrix index.
fn nearest_neighbor(matrix: &CostMatrix) -> Vec<usize> {
    let n = matrix.len();
    let mut visited = vec![false; n];
    let mut tour = Vec::with_capacity(n);
    let mut current = 0;
    visited[0] = true;
    tour.push(0);

    for _ in 1..n {
        let mut best: Option<(usize, i64)> = None;
        for candidate in 1..n {
            if visited[candidate] {
                continue;
            }
            let distance = matrix.distance(current, candidate);
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((candidate, distance));
            }
        }

        let Some((next, _)) = best else { break };
        visited[next] = true;
        tour.push(next);
        current = next;
    }

    tour
}

/// Applied-move budget for `destinations` stops: `min(destinations², max_improvements)`.
fn improvement_cap(destinations: usize, options: &SequencerOptions) -> usize {
    destinations
        .saturating_mul(destinations)
        .min(options.max_improvements)
}

/// Runs 2-opt until no move improves or `cap` moves were applied; returns the moves applied.
fn improve(matrix: &CostMatrix, tour: &mut [usize], cap: usize) -> usize {
    let mut applied = 0;
    while applied < cap && two_opt_improve(matrix, tour) {
        applied += 1;
    }
    applied
}

/// 2-opt: reverse a segment of the tour to reduce total distance.
/// Applies the first strictly improving move found and returns true.
///
/// The segment never includes position 0, so the origin stays fixed.
/// Segment reversal flips leg direction, so the change is computed over the
/// reversed interior as well as the two replaced edges.
fn two_opt_improve(matrix: &CostMatrix, tour: &mut [usize]) -> bool {
    let n = tour.len();
    if n < 3 {
        return false;
    }

    for i in 0..n - 2 {
        for j in i + 2..n {
            if reversal_delta(matrix, tour, i, j) < 0 {
                tour[i + 1..=j].reverse();
                return true;
            }
        }
    }

    false
}

/// Change in closed-tour distance from reversing positions `i + 1..=j`.
fn reversal_delta(matrix: &CostMatrix, tour: &[usize], i: usize, j: usize) -> i64 {
    let n = tour.len();
    let before = tour[i];
    let first = tour[i + 1];
    let last = tour[j];
    let after = tour[(j + 1) % n];

    let mut forward = 0;
    let mut backward = 0;
    for k in i + 1..j {
        forward += matrix.distance(tour[k], tour[k + 1]);
        backward += matrix.distance(tour[k + 1], tour[k]);
    }

    let removed = matrix.distance(before, first) + matrix.distance(last, after) + forward;
    let added = matrix.distance(before, last) + matrix.distance(first, after) + backward;
    added - removed
}

fn closed_legs(tour: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    tour.iter()
        .copied()
        .zip(tour.iter().copied().skip(1).chain(tour.first().copied()))
}

fn tour_distance(matrix: &CostMatrix, tour: &[usize]) -> i64 {
    closed_legs(tour).map(|(from, to)| matrix.distance(from, to)).sum()
}

fn tour_duration(matrix: &CostMatrix, tour: &[usize]) -> i64 {
    closed_legs(tour).map(|(from, to)| matrix.duration(from, to)).sum()
}
