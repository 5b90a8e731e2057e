//! OSRM HTTP adapter for distance matrices.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::location::Coordinate;
use crate::matrix::{Cost, CostMatrix};
use crate::traits::DistanceMatrixProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn table_url(&self, coordinates: &[Coordinate]) -> String {
        let coords = coordinates
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations=duration,distance",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }
}

impl DistanceMatrixProvider for OsrmClient {
    fn matrix_for(&self, coordinates: &[Coordinate]) -> Result<CostMatrix, ProviderError> {
        if coordinates.is_empty() {
            return CostMatrix::new(Vec::new(), Vec::new());
        }

        let url = self.table_url(coordinates);
        debug!(locations = coordinates.len(), %url, "requesting OSRM table");

        let response = self.client.get(url).send()?;

        // OSRM answers query errors with a 4xx status and a `{code, message}` body.
        let status_error = response.error_for_status_ref().err();
        if let Some(status_error) = status_error {
            return Err(match response.json::<OsrmTableResponse>() {
                Ok(body) if body.code != "Ok" => ProviderError::Backend {
                    code: body.code,
                    message: body.message.unwrap_or_default(),
                },
                _ => ProviderError::Request(status_error),
            });
        }

        response.json::<OsrmTableResponse>()?.into_matrix(coordinates)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    message: Option<String>,
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

impl OsrmTableResponse {
    fn into_matrix(self, coordinates: &[Coordinate]) -> Result<CostMatrix, ProviderError> {
        if self.code != "Ok" {
            return Err(ProviderError::Backend {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }

        let durations = self
            .durations
            .ok_or_else(|| ProviderError::Malformed("response has no durations".to_string()))?;
        let distances = self
            .distances
            .ok_or_else(|| ProviderError::Malformed("response has no distances".to_string()))?;

        let n = coordinates.len();
        if durations.len() != n || distances.len() != n {
            return Err(ProviderError::Malformed(format!(
                "expected {} rows, got {} duration and {} distance rows",
                n,
                durations.len(),
                distances.len()
            )));
        }

        let mut costs = Vec::with_capacity(n * n);
        for (from, (duration_row, distance_row)) in durations.iter().zip(&distances).enumerate() {
            if duration_row.len() != n || distance_row.len() != n {
                return Err(ProviderError::Malformed(format!("row {} is not {} wide", from, n)));
            }
            for to in 0..n {
                match (distance_row[to], duration_row[to]) {
                    (Some(distance), Some(duration)) => {
                        costs.push(Cost::new(distance.round() as i64, duration.round() as i64));
                    }
                    _ => return Err(ProviderError::Unreachable { from, to }),
                }
            }
        }

        CostMatrix::new(coordinates.to_vec(), costs)
    }
}
