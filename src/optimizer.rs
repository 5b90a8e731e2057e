//! Route optimization service.
//!
//! Geocodes the submitted identifiers, builds a cost matrix over the ones that
//! resolved, sequences the stops and turns the resulting time into a crew
//! recommendation. Each call is independent; the optimizer holds no state
//! between runs beyond its injected backends and configuration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{OptimizeError, ProviderError, ResolutionError};
use crate::location::{Coordinate, DropReason, DroppedLocation, Location};
use crate::matrix::CostMatrix;
use crate::polyline::Polyline;
use crate::sequencer::{SequencerOptions, Tour, sequence};
use crate::traits::{DistanceMatrixProvider, Geocoder};
use crate::workforce::{JobType, WorkforcePolicy, WorkforceRecommendation};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub sequencer: SequencerOptions,
    pub policy: WorkforcePolicy,
    /// Matrix requests per run, counting retries over a reduced location set.
    pub max_matrix_attempts: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            sequencer: SequencerOptions::default(),
            policy: WorkforcePolicy::default(),
            max_matrix_attempts: 3,
        }
    }
}

/// Cooperative cancellation flag shared with a running optimization.
///
/// Honoured until the distance matrix request is issued.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), OptimizeError> {
        if self.is_cancelled() {
            Err(OptimizeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One directed leg of the realized tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub from: String,
    pub to: String,
    /// Meters.
    pub distance: u64,
    /// Seconds.
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    /// Destination identifiers in visiting order, origin excluded.
    pub order: Vec<String>,
    /// Resolved destinations in visiting order.
    pub waypoints: Vec<Location>,
    /// Legs of the closed tour, starting and ending at the origin.
    pub legs: Vec<Leg>,
    /// Meters.
    pub total_distance: u64,
    /// Seconds spent driving.
    pub travel_time: u64,
    /// Seconds spent on site.
    pub service_time: u64,
    /// Seconds, `travel_time + service_time`.
    pub total_time: u64,
    pub geometry: Polyline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    pub route: OptimizedRoute,
    pub workforce: WorkforceRecommendation,
    /// Destination identifiers left out of the route, in input order.
    pub dropped: Vec<DroppedLocation>,
}

pub struct RouteOptimizer<G, M> {
    geocoder: G,
    provider: M,
    config: OptimizerConfig,
}

impl<G, M> RouteOptimizer<G, M>
where
    G: Geocoder,
    M: DistanceMatrixProvider,
{
    pub fn new(geocoder: G, provider: M) -> Self {
        Self::with_config(geocoder, provider, OptimizerConfig::default())
    }

    pub fn with_config(geocoder: G, provider: M, config: OptimizerConfig) -> Self {
        Self {
            geocoder,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn optimize<S>(
        &self,
        origin: &str,
        destinations: &[S],
        job_type: JobType,
    ) -> Result<Optimization, OptimizeError>
    where
        S: AsRef<str> + Sync,
    {
        self.optimize_with(origin, destinations, job_type, &Cancellation::new())
    }

    /// Same as [`optimize`](Self::optimize), checking `cancel` before
    /// geocoding, once geocoding has joined, and before each matrix request.
    pub fn optimize_with<S>(
        &self,
        origin: &str,
        destinations: &[S],
        job_type: JobType,
        cancel: &Cancellation,
    ) -> Result<Optimization, OptimizeError>
    where
        S: AsRef<str> + Sync,
    {
        cancel.check()?;

        let (origin_location, located) = rayon::join(
            || self.geocoder.locate(origin),
            || {
                destinations
                    .par_iter()
                    .map(|identifier| self.geocoder.locate(identifier.as_ref()))
                    .collect::<Vec<_>>()
            },
        );

        cancel.check()?;

        let origin_coordinate = match origin_location.coordinate {
            Some(coordinate) => coordinate,
            None => {
                let err = origin_location.failure.unwrap_or(ResolutionError::NotFound {
                    identifier: origin.to_string(),
                });
                return Err(OptimizeError::OriginUnresolved(err));
            }
        };

        let (mut stops, mut dropped) = partition_resolved(located)?;

        let mut attempt = 1;
        let (matrix, tour) = loop {
            cancel.check()?;
            match self.sequence_stops(origin_coordinate, &stops) {
                Ok(sequenced) => break sequenced,
                Err(err) => {
                    self.drop_unreachable(err, attempt, &mut stops, &mut dropped)?;
                    attempt += 1;
                }
            }
        };

        let optimization = self.compose(origin, job_type, &stops, &matrix, &tour, dropped)?;

        info!(
            %job_type,
            stops = optimization.route.order.len(),
            dropped = optimization.dropped.len(),
            distance_m = optimization.route.total_distance,
            total_s = optimization.route.total_time,
            crew = optimization.workforce.crew_size,
            days = optimization.workforce.estimated_days,
            "optimized route"
        );

        Ok(optimization)
    }

    /// Builds the matrix over origin + `stops` and sequences it.
    fn sequence_stops(
        &self,
        origin: Coordinate,
        stops: &[Location],
    ) -> Result<(CostMatrix, Tour), MatrixFailure> {
        let coordinates: Vec<Coordinate> = std::iter::once(origin)
            .chain(stops.iter().filter_map(|stop| stop.coordinate))
            .collect();
        if coordinates.len() != stops.len() + 1 {
            return Err(MatrixFailure::Invariant(
                "unresolved location reached the matrix request".to_string(),
            ));
        }

        debug!(locations = coordinates.len(), "requesting cost matrix");
        let matrix = self.provider.matrix_for(&coordinates)?;
        if matrix.len() != coordinates.len() {
            return Err(MatrixFailure::Invariant(format!(
                "matrix covers {} locations, expected {}",
                matrix.len(),
                coordinates.len()
            )));
        }

        let tour = sequence(&matrix, &self.config.sequencer)?;
        Ok((matrix, tour))
    }

    /// Removes the stops named by an `Unreachable` error so the matrix can be
    /// requested again; any other failure, or running out of attempts or
    /// stops, ends the run.
    fn drop_unreachable(
        &self,
        failure: MatrixFailure,
        attempt: u32,
        stops: &mut Vec<Location>,
        dropped: &mut Vec<DroppedLocation>,
    ) -> Result<(), OptimizeError> {
        let err = match failure {
            MatrixFailure::Invariant(message) => {
                return Err(OptimizeError::InternalInvariantViolation(message));
            }
            MatrixFailure::Provider(err) => err,
        };

        let (from, to) = match err {
            ProviderError::Unreachable { from, to } => (from, to),
            err => return Err(err.into()),
        };

        // Matrix index 0 is the origin; stop k sits at index k + 1.
        let mut indices: Vec<usize> = [from, to]
            .into_iter()
            .filter(|&index| index > 0 && index <= stops.len())
            .map(|index| index - 1)
            .collect();
        indices.sort_unstable();
        indices.dedup();

        if indices.is_empty()
            || indices.len() >= stops.len()
            || attempt >= self.config.max_matrix_attempts
        {
            return Err(ProviderError::Unreachable { from, to }.into());
        }

        for index in indices.into_iter().rev() {
            let stop = stops.remove(index);
            warn!(identifier = %stop.identifier, "dropping unreachable destination");
            dropped.push(DroppedLocation::new(stop.identifier, DropReason::Unreachable));
        }
        Ok(())
    }

    fn compose(
        &self,
        origin: &str,
        job_type: JobType,
        stops: &[Location],
        matrix: &CostMatrix,
        tour: &Tour,
        dropped: Vec<DroppedLocation>,
    ) -> Result<Optimization, OptimizeError> {
        check_permutation(&tour.order, stops.len())?;

        let names: Vec<&str> = std::iter::once(origin)
            .chain(stops.iter().map(|stop| stop.identifier.as_str()))
            .collect();

        let legs = tour
            .legs()
            .into_iter()
            .map(|(from, to)| -> Result<Leg, OptimizeError> {
                let cost = matrix.get(from, to);
                Ok(Leg {
                    from: names[from].to_string(),
                    to: names[to].to_string(),
                    distance: non_negative(cost.distance)?,
                    duration: non_negative(cost.duration)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let waypoints: Vec<Location> = tour.order.iter().map(|&i| stops[i - 1].clone()).collect();
        let order = waypoints.iter().map(|w| w.identifier.clone()).collect();

        let policy = &self.config.policy;
        let travel_time = non_negative(tour.total_duration)?;
        let service_time = policy.service_seconds(job_type, waypoints.len());
        let total_time = travel_time + service_time;

        let workforce = policy.estimate(job_type, waypoints.len(), total_time as f64 / 3600.0);

        Ok(Optimization {
            route: OptimizedRoute {
                order,
                waypoints,
                legs,
                total_distance: non_negative(tour.total_distance)?,
                travel_time,
                service_time,
                total_time,
                geometry: Polyline::from_tour(matrix, tour),
            },
            workforce,
            dropped,
        })
    }
}

enum MatrixFailure {
    Provider(ProviderError),
    Invariant(String),
}

impl From<ProviderError> for MatrixFailure {
    fn from(err: ProviderError) -> Self {
        MatrixFailure::Provider(err)
    }
}

/// Splits geocoded destinations into usable stops and dropped identifiers.
///
/// Fails when nothing resolved: with [`OptimizeError::GeocoderUnavailable`]
/// if every failure was transient, otherwise [`OptimizeError::NoValidDestinations`].
fn partition_resolved(
    located: Vec<Location>,
) -> Result<(Vec<Location>, Vec<DroppedLocation>), OptimizeError> {
    let attempted = located.len();
    let mut stops = Vec::with_capacity(attempted);
    let mut dropped = Vec::new();
    let mut all_transient = attempted > 0;

    for location in located {
        if location.is_resolved() {
            stops.push(location);
            continue;
        }

        let reason = match &location.failure {
            Some(ResolutionError::Transient { .. }) => DropReason::GeocoderUnavailable,
            Some(ResolutionError::Invalid { .. }) => DropReason::Invalid,
            Some(ResolutionError::NotFound { .. }) | None => DropReason::NotFound,
        };
        all_transient &= reason == DropReason::GeocoderUnavailable;

        match &location.failure {
            Some(err) => warn!(identifier = %location.identifier, error = %err, "dropping destination"),
            None => warn!(identifier = %location.identifier, "dropping destination"),
        }
        dropped.push(DroppedLocation::new(location.identifier, reason));
    }

    if stops.is_empty() {
        if all_transient {
            return Err(OptimizeError::GeocoderUnavailable { attempted });
        }
        return Err(OptimizeError::NoValidDestinations { dropped });
    }

    Ok((stops, dropped))
}

fn check_permutation(order: &[usize], stops: usize) -> Result<(), OptimizeError> {
    let mut seen = vec![false; stops + 1];
    for &index in order {
        if index == 0 || index > stops || seen[index] {
            return Err(OptimizeError::InternalInvariantViolation(format!(
                "sequenced order {:?} is not a permutation of 1..={}",
                order, stops
            )));
        }
        seen[index] = true;
    }
    if order.len() != stops {
        return Err(OptimizeError::InternalInvariantViolation(format!(
            "sequenced {} of {} stops",
            order.len(),
            stops
        )));
    }
    Ok(())
}

fn non_negative(value: i64) -> Result<u64, OptimizeError> {
    u64::try_from(value).map_err(|_| {
        OptimizeError::InternalInvariantViolation(format!("negative total {}", value))
    })
}
