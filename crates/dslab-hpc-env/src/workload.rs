//! Job queue and workload generation.

use rand::prelude::*;
use rand_distr::Exp;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::job::Job;

/// Workload manager state consumed by the environment.
pub trait WorkloadManager {
    /// Returns the jobs waiting for scheduling in arrival order.
    fn pending_jobs(&self) -> &[Job];

    /// Returns the time of the last scheduling decision.
    fn last_time(&self) -> f64;
}

/// Queue of pending jobs.
#[derive(Clone, Debug, Default)]
pub struct JobQueue {
    pending: Vec<Job>,
    last_time: f64,
}

impl JobQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the job to the end of the queue.
    pub fn submit(&mut self, job: Job) {
        self.pending.push(job);
    }

    /// Removes and returns the job at the given position.
    pub fn take(&mut self, index: usize) -> Job {
        self.pending.remove(index)
    }

    /// Records the time of the scheduling decision.
    pub fn set_last_time(&mut self, time: f64) {
        self.last_time = time;
    }

    /// Returns the number of pending jobs.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Checks whether there are no pending jobs.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl WorkloadManager for JobQueue {
    fn pending_jobs(&self) -> &[Job] {
        &self.pending
    }

    fn last_time(&self) -> f64 {
        self.last_time
    }
}

// WORKLOAD ------------------------------------------------------------------------------------------------------------

/// Workload definition: either explicit jobs or parameters of a synthetic workload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadConfig {
    /// Explicit list of jobs.
    Jobs(Vec<Job>),
    /// Synthetic workload.
    Generate(GeneratorConfig),
}

/// Parameters of a synthetic workload.
///
/// Requests are drawn uniformly from the inclusive ranges, inter-arrival times are exponential.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of jobs.
    pub count: usize,
    /// Random seed.
    pub seed: u64,
    /// Mean number of job arrivals per time unit, all jobs arrive at time 0 if not positive.
    pub arrival_rate: f64,
    /// Range of requested running time.
    pub runtime: (f64, f64),
    /// Range of requested cores.
    pub cores: (u32, u32),
    /// Range of requested memory.
    pub memory: (f64, f64),
    /// Range of requested memory bandwidth.
    pub mem_bw: (f64, f64),
}

impl WorkloadConfig {
    /// Returns the jobs sorted by submit time.
    pub fn jobs(&self) -> Result<Vec<Job>, ConfigError> {
        let mut jobs = match self {
            WorkloadConfig::Jobs(jobs) => jobs.clone(),
            WorkloadConfig::Generate(config) => generate_jobs(config)?,
        };
        jobs.sort_by(|a, b| a.submit_time.total_cmp(&b.submit_time));
        Ok(jobs)
    }
}

impl GeneratorConfig {
    /// Checks that the ranges are not empty and the arrival rate is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("runtime", self.runtime),
            ("cores", (self.cores.0 as f64, self.cores.1 as f64)),
            ("memory", self.memory),
            ("mem_bw", self.mem_bw),
        ];
        for (option, (low, high)) in ranges {
            if !(low.is_finite() && high.is_finite() && low <= high) {
                return Err(ConfigError::InvalidRange { option, low, high });
            }
        }
        if !(self.arrival_rate.is_finite() && self.arrival_rate >= 0.) {
            return Err(ConfigError::InvalidArrivalRate(self.arrival_rate));
        }
        Ok(())
    }
}

/// Generates a synthetic workload, the same for the same config.
pub fn generate_jobs(config: &GeneratorConfig) -> Result<Vec<Job>, ConfigError> {
    config.validate()?;
    let mut rng = Pcg64::seed_from_u64(config.seed);
    let arrivals = if config.arrival_rate > 0. {
        let dist = Exp::new(config.arrival_rate).map_err(|_| ConfigError::InvalidArrivalRate(config.arrival_rate))?;
        Some(dist)
    } else {
        None
    };
    let mut time = 0.;
    let mut jobs = Vec::with_capacity(config.count);
    for id in 0..config.count {
        if let Some(dist) = &arrivals {
            time += dist.sample(&mut rng);
        }
        jobs.push(Job::new(
            id as u64,
            time,
            rng.gen_range(config.runtime.0..=config.runtime.1),
            rng.gen_range(config.cores.0..=config.cores.1),
            rng.gen_range(config.memory.0..=config.memory.1),
            rng.gen_range(config.mem_bw.0..=config.mem_bw.1),
        ));
    }
    Ok(jobs)
}
