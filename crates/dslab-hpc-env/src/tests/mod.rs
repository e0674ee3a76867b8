mod test_cluster;
mod test_config;
mod test_reward;

use crate::job::Job;
use crate::simulator::{ResourceLimits, Simulator};
use crate::workload::WorkloadManager;

/// Workload manager with fixed state.
struct StaticWorkload {
    jobs: Vec<Job>,
    last_time: f64,
}

impl WorkloadManager for StaticWorkload {
    fn pending_jobs(&self) -> &[Job] {
        &self.jobs
    }

    fn last_time(&self) -> f64 {
        self.last_time
    }
}

/// Simulator with fixed time and constant power.
struct StaticSimulator {
    time: f64,
    power: f64,
    limits: ResourceLimits,
}

impl Simulator for StaticSimulator {
    fn simulation_time(&self) -> f64 {
        self.time
    }

    fn get_joules(&self, delta_time: f64) -> f64 {
        self.power * delta_time
    }

    fn job_limits(&self) -> ResourceLimits {
        self.limits
    }
}

fn job_with_requests(id: u64, req_time: f64, req_cores: u32, memory: f64, memory_vol: f64) -> Job {
    Job::new(id, id as f64, req_time, req_cores, memory, memory_vol)
}

fn jobs(count: usize) -> Vec<Job> {
    (0..count as u64)
        .map(|i| job_with_requests(i, 1. + i as f64, 1 + i as u32 % 4, 10. * (i % 3) as f64, 2.))
        .collect()
}
