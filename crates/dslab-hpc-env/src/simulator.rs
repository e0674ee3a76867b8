//! Read interface of the simulation engine.

use serde::{Deserialize, Serialize};

use crate::job::Job;

/// Global upper bounds on job requests used to normalize the observation.
///
/// Each limit is not less than the largest corresponding request in the workload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum requested running time.
    pub max_time: f64,
    /// Maximum requested number of cores.
    pub max_core: f64,
    /// Maximum requested memory.
    pub max_mem: f64,
    /// Maximum requested memory bandwidth.
    pub max_mem_vol: f64,
}

impl ResourceLimits {
    /// Creates resource limits from explicit values.
    pub fn new(max_time: f64, max_core: f64, max_mem: f64, max_mem_vol: f64) -> Self {
        Self {
            max_time,
            max_core,
            max_mem,
            max_mem_vol,
        }
    }

    /// Computes the limits as maximum requests over the given jobs (zeros if there are no jobs).
    pub fn from_jobs<'a, I>(jobs: I) -> Self
    where
        I: IntoIterator<Item = &'a Job>,
    {
        jobs.into_iter().fold(Self::default(), |limits, job| Self {
            max_time: limits.max_time.max(job.req_time),
            max_core: limits.max_core.max(job.req_cores as f64),
            max_mem: limits.max_mem.max(job.memory),
            max_mem_vol: limits.max_mem_vol.max(job.memory_vol),
        })
    }
}

/// Simulation state consumed by the environment.
pub trait Simulator {
    /// Returns the current simulation time.
    fn simulation_time(&self) -> f64;

    /// Returns the energy in joules consumed by the platform over the last `delta_time` seconds.
    fn get_joules(&self, delta_time: f64) -> f64;

    /// Returns the global limits of job requests.
    fn job_limits(&self) -> ResourceLimits;
}
