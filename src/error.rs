//! Error taxonomy for geocoding, distance lookups and optimization runs.

use thiserror::Error;

use crate::location::DroppedLocation;

/// Failure to resolve a single location identifier.
///
/// Never fatal on its own; the optimizer excludes the location and reports it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("invalid location identifier {identifier:?}")]
    Invalid { identifier: String },

    #[error("no match found for {identifier:?}")]
    NotFound { identifier: String },

    #[error("geocoder unavailable for {identifier:?} after {attempts} attempt(s): {reason}")]
    Transient {
        identifier: String,
        attempts: u32,
        reason: String,
    },
}

impl ResolutionError {
    /// Returns `true` when a later attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolutionError::Transient { .. })
    }

    pub fn identifier(&self) -> &str {
        match self {
            ResolutionError::Invalid { identifier }
            | ResolutionError::NotFound { identifier }
            | ResolutionError::Transient { identifier, .. } => identifier,
        }
    }
}

/// Failure of the distance backend. Fatal for the matrix it was building.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend error: {code} - {message}")]
    Backend { code: String, message: String },

    #[error("malformed matrix: {0}")]
    Malformed(String),

    #[error("no route from location {from} to location {to}")]
    Unreachable { from: usize, to: usize },

    #[error("non-positive cost from location {from} to location {to} (distance {distance}, duration {duration})")]
    DegenerateEntry {
        from: usize,
        to: usize,
        distance: i64,
        duration: i64,
    },
}

/// Fatal outcome of a [`RouteOptimizer`](crate::optimizer::RouteOptimizer) run.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("origin could not be resolved: {0}")]
    OriginUnresolved(ResolutionError),

    #[error("no valid destinations ({} identifier(s) dropped)", .dropped.len())]
    NoValidDestinations { dropped: Vec<DroppedLocation> },

    #[error("geocoder unavailable for all {attempted} destination(s)")]
    GeocoderUnavailable { attempted: usize },

    #[error("distance provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("optimization cancelled")]
    Cancelled,

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}
