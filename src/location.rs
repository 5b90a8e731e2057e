//! Stop locations and their resolution state.

use serde::{Deserialize, Serialize};

use crate::error::ResolutionError;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` when both components are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// A submitted stop identifier (postcode or address) and what the geocoder made of it.
///
/// Resolved once per optimization run and not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub identifier: String,
    pub coordinate: Option<Coordinate>,
    /// Formatted address returned by the geocoding backend, when it has one.
    pub address: Option<String>,
    #[serde(skip)]
    pub failure: Option<ResolutionError>,
}

impl Location {
    pub fn unresolved(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            coordinate: None,
            address: None,
            failure: None,
        }
    }

    pub fn resolved(identifier: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            coordinate: Some(coordinate),
            ..Self::unresolved(identifier)
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn failed(identifier: impl Into<String>, error: ResolutionError) -> Self {
        Self {
            failure: Some(error),
            ..Self::unresolved(identifier)
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.coordinate.is_some()
    }
}

/// Why a destination was left out of the sequenced route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The identifier was blank or malformed.
    Invalid,
    /// The geocoder has no match for the identifier.
    NotFound,
    /// The geocoder could not be reached after its retries.
    GeocoderUnavailable,
    /// The distance provider has no route to or from the stop.
    Unreachable,
}

/// A destination identifier reported back to the caller as excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedLocation {
    pub identifier: String,
    pub reason: DropReason,
}

impl DroppedLocation {
    pub fn new(identifier: impl Into<String>, reason: DropReason) -> Self {
        Self {
            identifier: identifier.into(),
            reason,
        }
    }
}
