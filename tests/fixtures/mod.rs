//! Test fixtures for route-crew-planner.
//!
//! Provides realistic test data including:
//! - Real London and South East England postcodes with approximate coordinates
//! - A geocoder pre-loaded with them

pub mod uk_locations;

pub use uk_locations::*;
