//! Registry of job and core selection policies.
//!
//! Each policy is identified by a name and resolves to a [`Selection`]: either a uniform random choice
//! or a scoring function whose extremal value picks the candidate.

use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::job::Job;

/// Read-only view of a core together with its owning processor and node.
pub trait CoreInfo {
    /// Peak compute capability of the core in GFLOP/s.
    fn peak_gflops(&self) -> f64;
    /// Number of cores running a job in the owning processor.
    fn processor_busy_cores(&self) -> usize;
    /// Currently available memory of the owning node.
    fn node_current_mem(&self) -> f64;
    /// Currently available memory bandwidth of the owning processor.
    fn processor_current_mem_bw(&self) -> f64;
    /// Static (idle) power of the core in W.
    fn static_power(&self) -> f64;
    /// Dynamic power of the core under load in W.
    fn dynamic_power(&self) -> f64;
}

/// Policy for choosing one candidate from a list.
pub enum Selection<T> {
    /// Uniformly random candidate.
    Random,
    /// Candidate with the lowest score.
    Lowest(fn(&T) -> f64),
    /// Candidate with the highest score.
    Highest(fn(&T) -> f64),
}

impl<T> Selection<T> {
    /// Returns the index of the selected candidate, or `None` if there are no candidates.
    ///
    /// Among candidates with equal scores the first one is selected.
    pub fn select<R: Rng>(&self, candidates: &[T], rng: &mut R) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        match self {
            Selection::Random => Some(rng.gen_range(0..candidates.len())),
            Selection::Lowest(score) => Some(extremum(candidates, *score, |a, b| a < b)),
            Selection::Highest(score) => Some(extremum(candidates, *score, |a, b| a > b)),
        }
    }
}

fn extremum<T>(candidates: &[T], score: fn(&T) -> f64, better: fn(f64, f64) -> bool) -> usize {
    let mut best = 0;
    let mut best_score = score(&candidates[0]);
    for (i, candidate) in candidates.iter().enumerate().skip(1) {
        let s = score(candidate);
        if better(s, best_score) {
            best = i;
            best_score = s;
        }
    }
    best
}

// JOB SELECTION -------------------------------------------------------------------------------------------------------

/// Job selection policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobSelectorKey {
    /// Random job in the queue.
    Random,
    /// Oldest job in the queue.
    First,
    /// Job with the least requested running time.
    Shortest,
    /// Job with the least requested cores.
    Smallest,
    /// Job with the least requested memory.
    LowMem,
    /// Job with the least requested memory bandwidth.
    LowMemOps,
}

impl JobSelectorKey {
    /// Returns the selection implementing the policy.
    pub fn selection(self) -> Selection<Job> {
        match self {
            JobSelectorKey::Random => Selection::Random,
            JobSelectorKey::First => Selection::Lowest(|job: &Job| job.submit_time),
            JobSelectorKey::Shortest => Selection::Lowest(|job: &Job| job.req_time),
            JobSelectorKey::Smallest => Selection::Lowest(|job: &Job| job.req_cores as f64),
            JobSelectorKey::LowMem => Selection::Lowest(|job: &Job| job.memory),
            JobSelectorKey::LowMemOps => Selection::Lowest(|job: &Job| job.memory_vol),
        }
    }
}

// CORE SELECTION ------------------------------------------------------------------------------------------------------

/// Core selection policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CoreSelectorKey {
    /// Random core in the pool.
    Random,
    /// Core with the highest peak compute capability.
    HighGflops,
    /// Core in the processor with the most cores running jobs.
    HighCores,
    /// Core in the node with the most available memory.
    HighMem,
    /// Core in the processor with the most available memory bandwidth.
    HighMemBw,
    /// Core with the lowest power consumption.
    LowPower,
}

impl CoreSelectorKey {
    /// Returns the selection implementing the policy.
    ///
    /// `HighMemBw` seeks the maximum of the raw bandwidth while the other scored policies seek
    /// the minimum of a negated value.
    pub fn selection<C: CoreInfo>(self) -> Selection<C> {
        match self {
            CoreSelectorKey::Random => Selection::Random,
            CoreSelectorKey::HighGflops => Selection::Lowest(|core: &C| -core.peak_gflops()),
            CoreSelectorKey::HighCores => Selection::Lowest(|core: &C| -(core.processor_busy_cores() as f64)),
            CoreSelectorKey::HighMem => Selection::Lowest(|core: &C| -core.node_current_mem()),
            CoreSelectorKey::HighMemBw => Selection::Highest(|core: &C| core.processor_current_mem_bw()),
            CoreSelectorKey::LowPower => Selection::Lowest(|core: &C| core.static_power() + core.dynamic_power()),
        }
    }
}
