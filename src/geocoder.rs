//! Geocoder adapters: Mapbox forward geocoding and a static lookup table.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ResolutionError;
use crate::location::{Coordinate, Location};
use crate::traits::Geocoder;

const ACCESS_TOKEN_ENV_VAR: &str = "MAPBOX_ACCESS_TOKEN";
const BASE_URL_ENV_VAR: &str = "MAPBOX_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapboxConfig {
    pub base_url: String,
    pub access_token: String,
    /// ISO 3166 alpha-2 country filter passed to the API.
    pub country: Option<String>,
    /// Appended to each query as `"<identifier>, <hint>"`.
    pub region_hint: Option<String>,
    pub timeout_secs: u64,
    /// Total attempts per identifier, including the first.
    pub max_attempts: u32,
    /// Base delay between attempts; grows linearly with the attempt number.
    pub retry_backoff_ms: u64,
}

impl Default for MapboxConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mapbox.com".to_string(),
            access_token: String::new(),
            country: Some("gb".to_string()),
            region_hint: Some("UK".to_string()),
            timeout_secs: 10,
            max_attempts: 3,
            retry_backoff_ms: 250,
        }
    }
}

impl MapboxConfig {
    /// Defaults with the access token (and optionally the base URL) taken from the environment.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let access_token = std::env::var(ACCESS_TOKEN_ENV_VAR)?;
        let mut config = Self {
            access_token,
            ..Self::default()
        };
        if let Ok(base_url) = std::env::var(BASE_URL_ENV_VAR) {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// Result of a single HTTP attempt.
#[derive(Debug)]
enum Attempt {
    Found(Coordinate, Option<String>),
    NotFound,
    Invalid,
    Retry(String),
    GiveUp(String),
}

#[derive(Debug, Clone)]
pub struct MapboxGeocoder {
    config: MapboxConfig,
    client: reqwest::blocking::Client,
}

impl MapboxGeocoder {
    pub fn new(config: MapboxConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn query_text(&self, identifier: &str) -> String {
        match &self.config.region_hint {
            Some(hint) => format!("{}, {}", identifier, hint),
            None => identifier.to_string(),
        }
    }

    fn search_url(&self, identifier: &str) -> Option<Url> {
        let mut url = Url::parse(&format!(
            "{}/geocoding/v5/mapbox.places/",
            self.config.base_url.trim_end_matches('/')
        ))
        .ok()?;

        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push(&format!("{}.json", self.query_text(identifier)));

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("access_token", &self.config.access_token);
            query.append_pair("limit", "1");
            if let Some(country) = &self.config.country {
                query.append_pair("country", country);
            }
        }

        Some(url)
    }

    fn attempt(&self, url: &Url) -> Attempt {
        let response = match self.client.get(url.clone()).send() {
            Ok(response) => response,
            Err(err) if err.is_timeout() || err.is_connect() || err.is_request() => {
                return Attempt::Retry(err.to_string());
            }
            Err(err) => return Attempt::GiveUp(err.to_string()),
        };

        let status = response.status();
        if let Some(outcome) = classify_status(status) {
            return outcome;
        }

        match response.json::<MapboxResponse>() {
            Ok(body) => body.into_attempt(),
            Err(err) => Attempt::GiveUp(format!("undecodable response: {}", err)),
        }
    }

    fn lookup(&self, identifier: &str) -> Result<(Coordinate, Option<String>), ResolutionError> {
        let identifier = identifier.trim();
        let invalid = || ResolutionError::Invalid {
            identifier: identifier.to_string(),
        };
        // `;` separates batch queries in the places path.
        if identifier.is_empty() || identifier.contains(';') {
            return Err(invalid());
        }
        let url = self.search_url(identifier).ok_or_else(invalid)?;

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_reason = String::new();
        for attempt in 1..=max_attempts {
            match self.attempt(&url) {
                Attempt::Found(coordinate, address) => {
                    debug!(identifier, lat = coordinate.lat, lng = coordinate.lng, "geocoded");
                    return Ok((coordinate, address));
                }
                Attempt::NotFound => {
                    return Err(ResolutionError::NotFound {
                        identifier: identifier.to_string(),
                    });
                }
                Attempt::Invalid => return Err(invalid()),
                Attempt::GiveUp(reason) => {
                    return Err(ResolutionError::Transient {
                        identifier: identifier.to_string(),
                        attempts: attempt,
                        reason,
                    });
                }
                Attempt::Retry(reason) => {
                    warn!(identifier, attempt, %reason, "geocoding attempt failed");
                    last_reason = reason;
                    if attempt < max_attempts {
                        std::thread::sleep(Duration::from_millis(
                            self.config.retry_backoff_ms * u64::from(attempt),
                        ));
                    }
                }
            }
        }

        Err(ResolutionError::Transient {
            identifier: identifier.to_string(),
            attempts: max_attempts,
            reason: last_reason,
        })
    }
}

impl Geocoder for MapboxGeocoder {
    fn resolve(&self, identifier: &str) -> Result<Coordinate, ResolutionError> {
        self.lookup(identifier).map(|(coordinate, _)| coordinate)
    }

    fn locate(&self, identifier: &str) -> Location {
        match self.lookup(identifier) {
            Ok((coordinate, Some(address))) => {
                Location::resolved(identifier, coordinate).with_address(address)
            }
            Ok((coordinate, None)) => Location::resolved(identifier, coordinate),
            Err(err) => Location::failed(identifier, err),
        }
    }
}

/// Maps non-success statuses onto an attempt outcome; `None` means read the body.
fn classify_status(status: StatusCode) -> Option<Attempt> {
    if status.is_success() {
        return None;
    }
    let outcome = match status {
        StatusCode::NOT_FOUND => Attempt::NotFound,
        StatusCode::UNPROCESSABLE_ENTITY => Attempt::Invalid,
        StatusCode::TOO_MANY_REQUESTS => Attempt::Retry(status.to_string()),
        status if status.is_server_error() => Attempt::Retry(status.to_string()),
        status => Attempt::GiveUp(status.to_string()),
    };
    Some(outcome)
}

#[derive(Debug, Deserialize)]
struct MapboxResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    /// `[lng, lat]`
    center: [f64; 2],
    place_name: Option<String>,
}

impl MapboxResponse {
    fn into_attempt(self) -> Attempt {
        match self.features.into_iter().next() {
            Some(feature) => {
                let [lng, lat] = feature.center;
                let coordinate = Coordinate::new(lat, lng);
                if coordinate.is_valid() {
                    Attempt::Found(coordinate, feature.place_name)
                } else {
                    Attempt::GiveUp(format!("coordinate out of range: {}, {}", lat, lng))
                }
            }
            None => Attempt::NotFound,
        }
    }
}

/// In-memory geocoder over a fixed identifier table.
///
/// Lookups ignore case and repeated whitespace, so `"sw1a 1aa"` matches `"SW1A  1AA"`.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, Coordinate>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, identifier: &str, coordinate: impl Into<Coordinate>) -> Self {
        self.insert(identifier, coordinate);
        self
    }

    pub fn insert(&mut self, identifier: &str, coordinate: impl Into<Coordinate>) {
        self.entries.insert(normalize(identifier), coordinate.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>, C: Into<Coordinate>> FromIterator<(S, C)> for StaticGeocoder {
    fn from_iter<I: IntoIterator<Item = (S, C)>>(iter: I) -> Self {
        let mut geocoder = Self::new();
        for (identifier, coordinate) in iter {
            geocoder.insert(identifier.as_ref(), coordinate);
        }
        geocoder
    }
}

impl Geocoder for StaticGeocoder {
    fn resolve(&self, identifier: &str) -> Result<Coordinate, ResolutionError> {
        let key = normalize(identifier);
        if key.is_empty() {
            return Err(ResolutionError::Invalid {
                identifier: identifier.to_string(),
            });
        }
        self.entries
            .get(&key)
            .copied()
            .ok_or_else(|| ResolutionError::NotFound {
                identifier: identifier.to_string(),
            })
    }
}

fn normalize(identifier: &str) -> String {
    identifier
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
