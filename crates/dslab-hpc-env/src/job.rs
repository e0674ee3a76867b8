//! Jobs submitted to the cluster.

use serde::{Deserialize, Serialize};

/// Job waiting in the queue or running on the platform.
///
/// All requested quantities are non-negative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job id, unique within a workload.
    pub id: u64,
    /// Time when the job is submitted to the queue.
    pub submit_time: f64,
    /// Requested running time.
    pub req_time: f64,
    /// Requested number of cores.
    pub req_cores: u32,
    /// Requested memory capacity.
    pub memory: f64,
    /// Requested memory bandwidth.
    pub memory_vol: f64,
}

impl Job {
    /// Creates a new job.
    pub fn new(id: u64, submit_time: f64, req_time: f64, req_cores: u32, memory: f64, memory_vol: f64) -> Self {
        Self {
            id,
            submit_time,
            req_time,
            req_cores,
            memory,
            memory_vol,
        }
    }
}
