//! Observation of the job queue state.
//!
//! The observation is a fixed-length vector with entries in `[0, 1]`:
//! - for each of requested time, cores, memory and memory bandwidth: minimum, first quartile, median,
//!   third quartile and maximum over the pending jobs, divided by the corresponding global limit
//!   (zeros if the queue is empty);
//! - the variation ratio of the job queue size with respect to the previous observation.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::job::Job;
use crate::simulator::ResourceLimits;

/// Number of tracked job request dimensions.
pub const REQUEST_DIMENSIONS: usize = 4;
/// Number of statistics computed per request dimension.
pub const STATS_PER_DIMENSION: usize = 5;

/// Set of fields included in the observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ObservationProfile {
    /// Job queue statistics only.
    Minimal,
    /// Additionally per-node and per-processor utilization.
    Small,
    /// Additionally per-core utilization.
    Normal,
}

impl ObservationProfile {
    /// Number of platform utilization fields preceding the job queue statistics.
    ///
    /// Utilization metrics are not collected yet, so every profile currently contributes no fields.
    pub fn platform_fields(&self) -> usize {
        match self {
            ObservationProfile::Minimal => 0,
            // TODO: add node memory and processor memory bandwidth fields (small), per-core load fields (normal)
            ObservationProfile::Small | ObservationProfile::Normal => 0,
        }
    }
}

/// Builds observations and keeps the job queue length seen by the previous one.
#[derive(Clone, Debug)]
pub struct ObservationBuilder {
    profile: ObservationProfile,
    queue_sensitivity: f64,
    last_queue_length: usize,
}

impl ObservationBuilder {
    /// Creates a builder. `queue_sensitivity` must be positive.
    pub fn new(profile: ObservationProfile, queue_sensitivity: f64) -> Self {
        Self {
            profile,
            queue_sensitivity,
            last_queue_length: 0,
        }
    }

    /// Returns the observation profile.
    pub fn profile(&self) -> ObservationProfile {
        self.profile
    }

    /// Returns the length of produced observations.
    pub fn size(&self) -> usize {
        self.profile.platform_fields() + REQUEST_DIMENSIONS * STATS_PER_DIMENSION + 1
    }

    /// Returns the job queue length recorded by the last observation.
    pub fn last_queue_length(&self) -> usize {
        self.last_queue_length
    }

    /// Builds the observation for the given pending jobs and records the queue length.
    pub fn build(&mut self, pending_jobs: &[Job], limits: &ResourceLimits) -> Vec<f32> {
        let mut observation = Vec::with_capacity(self.size());

        let requests: [(fn(&Job) -> f64, f64); REQUEST_DIMENSIONS] = [
            (|job: &Job| job.req_time, limits.max_time),
            (|job: &Job| job.req_cores as f64, limits.max_core),
            (|job: &Job| job.memory, limits.max_mem),
            (|job: &Job| job.memory_vol, limits.max_mem_vol),
        ];
        for (request, max) in requests {
            let values: Vec<f64> = pending_jobs.iter().map(request).collect();
            observation.extend(normalized_quartiles(values, max).map(|v| v as f32));
        }

        let queue_length = pending_jobs.len();
        observation.push(self.variation_ratio(queue_length) as f32);
        log::trace!(
            "observation: queue length {} -> {}, {:?}",
            self.last_queue_length,
            queue_length,
            observation
        );
        self.last_queue_length = queue_length;
        observation
    }

    /// Computes the normalized variation ratio of the queue length with respect to the recorded one.
    ///
    /// Returns 1 if either length is zero.
    pub fn variation_ratio(&self, queue_length: usize) -> f64 {
        let base = queue_length.min(self.last_queue_length);
        if base == 0 {
            return 1.0;
        }
        let ratio = (queue_length as f64 - self.last_queue_length as f64) / base as f64;
        ((ratio + self.queue_sensitivity) / (2. * self.queue_sensitivity)).clamp(0., 1.)
    }
}

/// Returns minimum, quartiles and maximum of the values divided by `max`.
///
/// Returns zeros if there are no values or `max` is not positive.
pub fn normalized_quartiles(mut values: Vec<f64>, max: f64) -> [f64; STATS_PER_DIMENSION] {
    if values.is_empty() || max <= 0. {
        return [0.; STATS_PER_DIMENSION];
    }
    values.sort_by(|a, b| a.total_cmp(b));
    [0., 25., 50., 75., 100.].map(|q| percentile(&values, q) / max)
}

/// Returns the `q`-th percentile of sorted non-empty values using linear interpolation
/// between the closest ranks.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100. * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}
