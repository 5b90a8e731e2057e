//! Directed travel cost matrix over a set of coordinates.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::location::Coordinate;

/// Travel cost of a single directed leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    /// Meters.
    pub distance: i64,
    /// Seconds.
    pub duration: i64,
}

impl Cost {
    pub const fn new(distance: i64, duration: i64) -> Self {
        Self { distance, duration }
    }
}

/// Square matrix of [`Cost`] values indexed by the coordinate order it was built from.
///
/// Index 0 is the origin, followed by the destinations in input order.
/// `get(i, j)` is the cost of travelling from `i` to `j`; symmetry is not assumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMatrix {
    coordinates: Vec<Coordinate>,
    costs: Vec<Cost>,
}

impl CostMatrix {
    /// Builds a matrix from a flat row-major list of `n * n` costs.
    pub fn new(coordinates: Vec<Coordinate>, costs: Vec<Cost>) -> Result<Self, ProviderError> {
        let n = coordinates.len();
        if costs.len() != n * n {
            return Err(ProviderError::Malformed(format!(
                "expected {} entries for {} locations, got {}",
                n * n,
                n,
                costs.len()
            )));
        }
        Ok(Self { coordinates, costs })
    }

    /// Builds a matrix from separate distance and duration rows.
    pub fn from_rows(
        coordinates: Vec<Coordinate>,
        distances: &[Vec<i64>],
        durations: &[Vec<i64>],
    ) -> Result<Self, ProviderError> {
        let n = coordinates.len();
        if distances.len() != n || durations.len() != n {
            return Err(ProviderError::Malformed(format!(
                "expected {} rows, got {} distance and {} duration rows",
                n,
                distances.len(),
                durations.len()
            )));
        }

        let mut costs = Vec::with_capacity(n * n);
        for (row, (distance_row, duration_row)) in distances.iter().zip(durations).enumerate() {
            if distance_row.len() != n || duration_row.len() != n {
                return Err(ProviderError::Malformed(format!("row {} is not {} wide", row, n)));
            }
            costs.extend(
                distance_row
                    .iter()
                    .zip(duration_row)
                    .map(|(&distance, &duration)| Cost::new(distance, duration)),
            );
        }

        Self::new(coordinates, costs)
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn get(&self, from: usize, to: usize) -> Cost {
        self.costs[from * self.len() + to]
    }

    pub fn distance(&self, from: usize, to: usize) -> i64 {
        self.get(from, to).distance
    }

    pub fn duration(&self, from: usize, to: usize) -> i64 {
        self.get(from, to).duration
    }

    /// Rejects non-positive costs between distinct coordinates and negative costs anywhere.
    ///
    /// Legs between identical coordinates (including the diagonal) may be zero.
    pub fn check_entries(&self) -> Result<(), ProviderError> {
        let n = self.len();
        for from in 0..n {
            for to in 0..n {
                let cost = self.get(from, to);
                let same_place = from == to || self.coordinates[from] == self.coordinates[to];
                let degenerate = if same_place {
                    cost.distance < 0 || cost.duration < 0
                } else {
                    cost.distance <= 0 || cost.duration <= 0
                };
                if degenerate {
                    return Err(ProviderError::DegenerateEntry {
                        from,
                        to,
                        distance: cost.distance,
                        duration: cost.duration,
                    });
                }
            }
        }
        Ok(())
    }
}
