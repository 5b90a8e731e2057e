//! Haversine distance matrix provider (fallback when OSRM is unavailable).
//!
//! Uses great-circle distance and an assumed speed to estimate travel time.
//! Less accurate than OSRM (ignores roads) but always available.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::location::Coordinate;
use crate::matrix::{Cost, CostMatrix};
use crate::traits::DistanceMatrixProvider;

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine-based distance matrix provider.
///
/// Produces a symmetric matrix. Distinct coordinates always get at least one
/// meter and one second so the sequencer never sees a zero leg between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaversineMatrix {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Calculate haversine distance between two points in kilometers.
    pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
        let lat1_rad = from.lat.to_radians();
        let lat2_rad = to.lat.to_radians();
        let delta_lat = (to.lat - from.lat).to_radians();
        let delta_lng = (to.lng - from.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Convert distance in km to travel time in seconds.
    fn km_to_seconds(&self, km: f64) -> i64 {
        let hours = km / self.speed_kmh;
        (hours * 3600.0).round() as i64
    }

    fn leg(&self, from: Coordinate, to: Coordinate) -> Cost {
        if from == to {
            return Cost::default();
        }
        let km = Self::haversine_km(from, to);
        let meters = (km * 1000.0).round() as i64;
        Cost::new(meters.max(1), self.km_to_seconds(km).max(1))
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, coordinates: &[Coordinate]) -> Result<CostMatrix, ProviderError> {
        if !(self.speed_kmh.is_finite() && self.speed_kmh > 0.0) {
            return Err(ProviderError::Malformed(format!(
                "speed must be positive, got {} km/h",
                self.speed_kmh
            )));
        }
        if let Some(index) = coordinates.iter().position(|c| !c.is_valid()) {
            return Err(ProviderError::Malformed(format!(
                "coordinate {} is out of range",
                index
            )));
        }

        let costs = coordinates
            .iter()
            .flat_map(|&from| coordinates.iter().map(move |&to| (from, to)))
            .map(|(from, to)| self.leg(from, to))
            .collect();

        CostMatrix::new(coordinates.to_vec(), costs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = HaversineMatrix::haversine_km(point(51.5, -0.12), point(51.5, -0.12));
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // London (51.5074, -0.1278) to Manchester (53.4808, -2.2426)
        // Great-circle distance ~262 km
        let dist = HaversineMatrix::haversine_km(point(51.5074, -0.1278), point(53.4808, -2.2426));
        assert!(dist > 250.0 && dist < 275.0, "London to Manchester should be ~262km, got {}", dist);
    }

    #[test]
    fn test_matrix_diagonal_is_zero() {
        let provider = HaversineMatrix::default();
        let locations = vec![point(51.50, -0.12), point(51.52, -0.10), point(51.48, -0.15)];
        let matrix = provider.matrix_for(&locations).unwrap();

        for i in 0..locations.len() {
            assert_eq!(matrix.get(i, i), Cost::default(), "Diagonal should be zero");
        }
        assert!(matrix.check_entries().is_ok());
    }

    #[test]
    fn test_matrix_symmetric() {
        let provider = HaversineMatrix::default();
        let locations = vec![point(51.50, -0.12), point(51.60, -0.20)];
        let matrix = provider.matrix_for(&locations).unwrap();

        assert_eq!(matrix.get(0, 1), matrix.get(1, 0), "Matrix should be symmetric");
    }

    #[test]
    fn test_reasonable_travel_time() {
        let provider = HaversineMatrix::new(40.0);
        // 10 km at 40 km/h = 0.25 hours = 900 seconds
        assert_eq!(provider.km_to_seconds(10.0), 900);
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(HaversineMatrix::new(0.0).matrix_for(&[point(51.5, 0.0)]).is_err());
        assert!(HaversineMatrix::default().matrix_for(&[point(95.0, 0.0)]).is_err());
    }
}
