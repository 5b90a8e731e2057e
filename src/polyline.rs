//! Polyline representation for route geometries.
//!
//! The optimizer emits the closed tour as a decoded coordinate sequence.
//! Encoding to a compact polyline string happens at the API boundary,
//! not in the planner core.

use serde::{Deserialize, Serialize};

use crate::location::Coordinate;
use crate::matrix::CostMatrix;
use crate::sequencer::Tour;

/// A route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Straight-line geometry of `tour`: origin, each stop in order, origin again.
    ///
    /// Empty when the tour has no stops.
    pub fn from_tour(matrix: &CostMatrix, tour: &Tour) -> Self {
        let coordinates = matrix.coordinates();
        let legs = tour.legs();
        let mut points = Vec::with_capacity(legs.len() + 1);
        if let Some(&(from, _)) = legs.first() {
            points.push(coordinates[from]);
        }
        points.extend(legs.into_iter().map(|(_, to)| coordinates[to]));
        Self { points }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_points() {
        let points = vec![Coordinate::new(51.5, -0.12), Coordinate::new(51.45, -0.97)];
        let polyline = Polyline::new(points.clone());
        assert_eq!(polyline.points(), &points[..]);
        assert_eq!(polyline.into_points(), points);
    }

    #[test]
    fn test_from_tour_closes_loop() {
        let coordinates = vec![
            Coordinate::new(51.50, -0.12),
            Coordinate::new(51.52, -0.10),
            Coordinate::new(51.48, -0.15),
        ];
        let matrix = CostMatrix::from_rows(
            coordinates.clone(),
            &[vec![0, 10, 10], vec![10, 0, 10], vec![10, 10, 0]],
            &[vec![0, 1, 1], vec![1, 0, 1], vec![1, 1, 0]],
        )
        .unwrap();
        let tour = Tour {
            order: vec![2, 1],
            total_distance: 30,
            total_duration: 3,
        };

        let polyline = Polyline::from_tour(&matrix, &tour);
        assert_eq!(
            polyline.points(),
            &[coordinates[0], coordinates[2], coordinates[1], coordinates[0]]
        );
    }

    #[test]
    fn test_empty_tour_has_no_points() {
        let matrix = CostMatrix::from_rows(vec![Coordinate::new(51.5, -0.12)], &[vec![0]], &[vec![0]])
            .unwrap();
        let tour = Tour {
            order: Vec::new(),
            total_distance: 0,
            total_duration: 0,
        };
        assert!(Polyline::from_tour(&matrix, &tour).points().is_empty());
    }
}
