//! route-crew-planner core
//!
//! Orders delivery/installation stops from a fixed origin and turns the
//! resulting travel and on-site time into a crew recommendation.

pub mod error;
pub mod geocoder;
pub mod haversine;
pub mod location;
pub mod matrix;
pub mod optimizer;
pub mod osrm;
pub mod polyline;
pub mod sequencer;
pub mod traits;
pub mod workforce;

pub use error::{OptimizeError, ProviderError, ResolutionError};
pub use location::{Coordinate, DropReason, DroppedLocation, Location};
pub use matrix::{Cost, CostMatrix};
pub use optimizer::{Cancellation, Optimization, OptimizedRoute, OptimizerConfig, RouteOptimizer};
pub use traits::{DistanceMatrixProvider, Geocoder};
pub use workforce::{JobType, WorkforcePolicy, WorkforceRecommendation};
