//! Scheduler applying decoded actions to the cluster simulation.

use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::action::Action;
use crate::cluster::ClusterSimulation;
use crate::job::Job;
use crate::selection::{CoreSelectorKey, JobSelectorKey};
use crate::workload::{JobQueue, WorkloadManager};

/// Result of applying an action.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Job was started on the cores.
    Scheduled {
        /// Job id.
        job: u64,
        /// Ids of allocated cores.
        cores: Vec<usize>,
    },
    /// Void action was applied.
    Skipped,
    /// No pending job fits the idle cores.
    NoFit,
}

/// Maps pending jobs to idle cores according to the selection policies of an action.
pub struct ActionScheduler {
    rng: Pcg64,
}

impl ActionScheduler {
    /// Creates the scheduler with the seed used by random selections.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Applies the action and records the decision time in the queue.
    pub fn apply(&mut self, action: Action, queue: &mut JobQueue, sim: &mut ClusterSimulation) -> Outcome {
        let outcome = match action {
            Action::Schedule { job, core } => self.schedule(job, core, queue, sim),
            Action::Void => Outcome::Skipped,
        };
        log::debug!("[{:.3}] action {} -> {:?}", sim.time(), action, outcome);
        queue.set_last_time(sim.time());
        outcome
    }

    fn schedule(
        &mut self,
        job_key: JobSelectorKey,
        core_key: CoreSelectorKey,
        queue: &mut JobQueue,
        sim: &mut ClusterSimulation,
    ) -> Outcome {
        let idle_cores = sim.platform().idle_core_count();
        let (positions, fitting): (Vec<usize>, Vec<Job>) = queue
            .pending_jobs()
            .iter()
            .enumerate()
            .filter(|(_, job)| job.req_cores.max(1) as usize <= idle_cores)
            .map(|(i, job)| (i, job.clone()))
            .unzip();
        let Some(selected) = job_key.selection().select(&fitting, &mut self.rng) else {
            return Outcome::NoFit;
        };
        let job = &fitting[selected];

        let cores = {
            let platform = sim.platform();
            let core_selection = core_key.selection();
            let mut candidates = platform.idle_cores();
            let mut cores = Vec::new();
            for _ in 0..job.req_cores.max(1) {
                match core_selection.select(&candidates, &mut self.rng) {
                    Some(idx) => cores.push(candidates.remove(idx).id()),
                    None => break,
                }
            }
            cores
        };

        match sim.start_job(job, &cores) {
            Ok(()) => {
                queue.take(positions[selected]);
                Outcome::Scheduled { job: job.id, cores }
            }
            Err(reason) => {
                log::warn!("[{:.3}] job {} can't be started: {:?}", sim.time(), job.id, reason);
                Outcome::NoFit
            }
        }
    }
}
