//! Backend seams for the route planner.
//!
//! The optimizer only talks to geocoding and routing services through these
//! traits, so any backend (or an in-memory stand-in) can be plugged in per run.

use crate::error::{ProviderError, ResolutionError};
use crate::location::{Coordinate, Location};
use crate::matrix::CostMatrix;

/// Resolves a free-text location identifier to a coordinate.
///
/// Each identifier is resolved independently; a failure for one must not
/// affect the others. Retrying is the implementation's concern, but once it
/// gives up it must report [`ResolutionError::Transient`] rather than
/// [`ResolutionError::NotFound`].
pub trait Geocoder: Send + Sync {
    fn resolve(&self, identifier: &str) -> Result<Coordinate, ResolutionError>;

    /// Resolves into a [`Location`], keeping any extra detail the backend offers.
    fn locate(&self, identifier: &str) -> Location {
        match self.resolve(identifier) {
            Ok(coordinate) => Location::resolved(identifier, coordinate),
            Err(err) => Location::failed(identifier, err),
        }
    }
}

/// Provides a directed distance/duration matrix for a set of coordinates.
///
/// The matrix is indexed by the provided coordinate order. Implementations
/// fail rather than return a partially filled matrix.
pub trait DistanceMatrixProvider: Send + Sync {
    fn matrix_for(&self, coordinates: &[Coordinate]) -> Result<CostMatrix, ProviderError>;
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    fn resolve(&self, identifier: &str) -> Result<Coordinate, ResolutionError> {
        (**self).resolve(identifier)
    }

    fn locate(&self, identifier: &str) -> Location {
        (**self).locate(identifier)
    }
}

impl<M: DistanceMatrixProvider + ?Sized> DistanceMatrixProvider for &M {
    fn matrix_for(&self, coordinates: &[Coordinate]) -> Result<CostMatrix, ProviderError> {
        (**self).matrix_for(coordinates)
    }
}
