//! Crew size and duration recommendations.
//!
//! All policy lives in [`WorkforcePolicy`], so the thresholds and tables can
//! be loaded from configuration without touching the estimation logic.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of work carried out at each stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    DeliveryOnly,
    InstallStand,
    DisplayBackdrop,
    Shelving,
    /// Any job type the policy tables do not know about.
    #[serde(other)]
    Unknown,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::DeliveryOnly => "delivery_only",
            JobType::InstallStand => "install_stand",
            JobType::DisplayBackdrop => "display_backdrop",
            JobType::Shelving => "shelving",
            JobType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = std::convert::Infallible;

    /// Unrecognized names map to [`JobType::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "delivery_only" => JobType::DeliveryOnly,
            "install_stand" => JobType::InstallStand,
            "display_backdrop" => JobType::DisplayBackdrop,
            "shelving" => JobType::Shelving,
            _ => JobType::Unknown,
        })
    }
}

/// A crew tier: how many people and how the recommendation is phrased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewTier {
    pub size: u32,
    pub rationale: String,
}

impl CrewTier {
    pub fn new(size: u32, rationale: impl Into<String>) -> Self {
        Self {
            size,
            rationale: rationale.into(),
        }
    }
}

/// Staffing tables and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkforcePolicy {
    /// On-site minutes per stop, by job type.
    pub service_minutes: HashMap<JobType, u32>,
    /// Used for job types missing from `service_minutes`.
    pub default_service_minutes: u32,
    /// Job types always staffed by the `solo` tier, whatever the job size.
    pub solo_job_types: HashSet<JobType>,
    pub solo: CrewTier,
    pub standard: CrewTier,
    pub large: CrewTier,
    /// More stops than this moves a non-solo job to the `large` tier.
    pub large_stop_threshold: usize,
    /// More elapsed hours than this moves a non-solo job to the `large` tier.
    pub large_hours_threshold: f64,
    /// Working hours per person per day.
    pub hours_per_day: f64,
}

impl Default for WorkforcePolicy {
    fn default() -> Self {
        Self {
            service_minutes: HashMap::from([
                (JobType::DeliveryOnly, 15),
                (JobType::InstallStand, 60),
                (JobType::DisplayBackdrop, 45),
                (JobType::Shelving, 30),
            ]),
            default_service_minutes: 30,
            solo_job_types: HashSet::from([JobType::DeliveryOnly]),
            solo: CrewTier::new(1, "Driver only"),
            standard: CrewTier::new(2, "Installer + Assistant"),
            large: CrewTier::new(3, "Team of 3 (Driver + 2 Installers)"),
            large_stop_threshold: 20,
            large_hours_threshold: 12.0,
            hours_per_day: 8.0,
        }
    }
}

/// Recommended staffing for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkforceRecommendation {
    pub crew_size: u32,
    pub estimated_days: u32,
    pub rationale: String,
}

/// Travel and on-site time for a job, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEstimate {
    pub travel_minutes: u64,
    pub job_minutes: u64,
    pub total_minutes: u64,
}

impl WorkforcePolicy {
    pub fn service_minutes_per_stop(&self, job_type: JobType) -> u32 {
        self.service_minutes
            .get(&job_type)
            .copied()
            .unwrap_or(self.default_service_minutes)
    }

    /// Total on-site time for `stops` destinations, in seconds.
    pub fn service_seconds(&self, job_type: JobType, stops: usize) -> u64 {
        stops as u64 * u64::from(self.service_minutes_per_stop(job_type)) * 60
    }

    pub fn time_estimate(&self, job_type: JobType, stops: usize, travel_minutes: u64) -> TimeEstimate {
        let job_minutes = stops as u64 * u64::from(self.service_minutes_per_stop(job_type));
        TimeEstimate {
            travel_minutes,
            job_minutes,
            total_minutes: travel_minutes + job_minutes,
        }
    }

    fn tier_for(&self, job_type: JobType, stop_count: usize, hours: f64) -> &CrewTier {
        if self.solo_job_types.contains(&job_type) {
            return &self.solo;
        }
        if stop_count > self.large_stop_threshold || hours > self.large_hours_threshold {
            &self.large
        } else {
            &self.standard
        }
    }

    /// Recommends a crew and the number of working days it needs.
    ///
    /// Days are `ceil(hours / (hours_per_day * crew_size))`, never less than one.
    /// Negative or non-finite hours count as zero.
    pub fn estimate(
        &self,
        job_type: JobType,
        stop_count: usize,
        total_elapsed_hours: f64,
    ) -> WorkforceRecommendation {
        let hours = if total_elapsed_hours.is_finite() {
            total_elapsed_hours.max(0.0)
        } else {
            0.0
        };

        let tier = self.tier_for(job_type, stop_count, hours);
        let crew_size = tier.size.max(1);
        let capacity = self.hours_per_day * f64::from(crew_size);
        let days = if capacity > 0.0 {
            (hours / capacity).ceil()
        } else {
            1.0
        };

        WorkforceRecommendation {
            crew_size,
            estimated_days: (days as u32).max(1),
            rationale: tier.rationale.clone(),
        }
    }
}
