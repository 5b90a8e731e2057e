//! Real UK postcodes for realistic test fixtures.
//!
//! Coordinates are postcode centroids rounded to four decimal places.

use route_crew_planner::geocoder::StaticGeocoder;
use route_crew_planner::location::Coordinate;

/// A postcode with its coordinates.
#[derive(Debug, Clone)]
pub struct Postcode {
    pub code: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Postcode {
    pub const fn new(code: &'static str, lat: f64, lng: f64) -> Self {
        Self { code, lat, lng }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Default depot used by the job planner.
pub const LONDON: Postcode = Postcode::new("London", 51.5074, -0.1278);

// ============================================================================
// Central London
// ============================================================================

pub const CENTRAL_LONDON: &[Postcode] = &[
    Postcode::new("SW1A 1AA", 51.5010, -0.1416),
    Postcode::new("EC1A 1BB", 51.5202, -0.0979),
    Postcode::new("W1A 1AA", 51.5186, -0.1438),
    Postcode::new("SE1 9SG", 51.5045, -0.0865),
    Postcode::new("N1 9GU", 51.5322, -0.1240),
    Postcode::new("E14 5AB", 51.5054, -0.0235),
    Postcode::new("WC2N 5DU", 51.5080, -0.1281),
    Postcode::new("NW1 2DB", 51.5246, -0.1340),
];

// ============================================================================
// South East England
// ============================================================================

pub const SOUTH_EAST: &[Postcode] = &[
    Postcode::new("RG1 1AF", 51.4560, -0.9690),
    Postcode::new("OX1 1DP", 51.7520, -1.2577),
    Postcode::new("CB2 1TN", 52.2040, 0.1190),
    Postcode::new("MK9 2FP", 52.0406, -0.7594),
    Postcode::new("GU1 3UW", 51.2362, -0.5704),
    Postcode::new("BN1 1AE", 50.8225, -0.1372),
];

/// Every fixture postcode, depot included.
pub fn all_postcodes() -> Vec<Postcode> {
    std::iter::once(LONDON)
        .chain(CENTRAL_LONDON.iter().cloned())
        .chain(SOUTH_EAST.iter().cloned())
        .collect()
}

/// Geocoder that knows every fixture postcode.
pub fn uk_geocoder() -> StaticGeocoder {
    all_postcodes()
        .into_iter()
        .map(|postcode| (postcode.code, postcode.coordinate()))
        .collect()
}
