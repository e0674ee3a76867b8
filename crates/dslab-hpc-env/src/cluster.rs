//! Simulation of a cluster executing jobs, built on DSLab core.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use serde::Serialize;

use dslab_core::cast;
use dslab_core::context::SimulationContext;
use dslab_core::event::Event;
use dslab_core::handler::EventHandler;
use dslab_core::simulation::Simulation;

use crate::job::Job;
use crate::platform::{FailReason, Platform};
use crate::simulator::{ResourceLimits, Simulator};
use crate::workload::{JobQueue, WorkloadManager};

// EVENTS --------------------------------------------------------------------------------------------------------------

/// Job is submitted to the queue.
#[derive(Clone, Serialize)]
pub struct JobArrival {
    /// Submitted job.
    pub job: Job,
}

/// Job has finished running on its cores.
#[derive(Clone, Serialize)]
pub struct JobCompletion {
    /// Id of the job.
    pub job_id: u64,
}

// ENERGY --------------------------------------------------------------------------------------------------------------

/// Energy meter calculates the platform energy consumption.
///
/// Keeps the history of power changes to compute the energy consumed over a recent time window.
#[derive(Debug, Clone)]
pub struct EnergyMeter {
    energy_consumed: f64,
    current_power: f64,
    prev_time: f64,
    // (time, energy consumed until time, power since time)
    history: VecDeque<(f64, f64, f64)>,
}

impl EnergyMeter {
    /// Creates meter.
    pub fn new() -> Self {
        Self {
            energy_consumed: 0.0,
            current_power: 0.0,
            prev_time: 0.0,
            history: VecDeque::new(),
        }
    }

    /// Invoked each time the power consumption is changed to update the total energy consumption.
    pub fn update(&mut self, time: f64, power: f64) {
        self.energy_consumed += (time - self.prev_time) * self.current_power;
        self.current_power = power;
        self.prev_time = time;
        match self.history.back_mut() {
            Some(last) if last.0 == time => last.2 = power,
            _ => self.history.push_back((time, self.energy_consumed, power)),
        }
    }

    /// Returns the total energy consumption at the time of the last update.
    pub fn energy_consumed(&self) -> f64 {
        self.energy_consumed
    }

    /// Returns the energy consumed until `time`.
    ///
    /// Times before the retained history are clamped to its start.
    pub fn energy_at(&self, time: f64) -> f64 {
        if time >= self.prev_time {
            return self.energy_consumed + (time - self.prev_time) * self.current_power;
        }
        let idx = self.history.partition_point(|&(start, _, _)| start <= time);
        match idx {
            0 => self.history.front().map_or(0., |&(_, energy, _)| energy),
            _ => {
                let (start, energy, power) = self.history[idx - 1];
                energy + power * (time - start)
            }
        }
    }

    /// Drops the history which is not needed to compute the energy consumed after `time`.
    pub fn forget_before(&mut self, time: f64) {
        while self.history.len() > 1 && self.history[1].0 <= time {
            self.history.pop_front();
        }
    }

    /// Returns the number of retained power changes.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Default for EnergyMeter {
    fn default() -> Self {
        Self::new()
    }
}

// CLUSTER -------------------------------------------------------------------------------------------------------------

/// Cluster component: submits arriving jobs to the queue and runs jobs on the platform.
///
/// Job running time equals its requested time.
pub struct Cluster {
    platform: Platform,
    queue: Rc<RefCell<JobQueue>>,
    energy_meter: EnergyMeter,
    pending_arrivals: usize,
    running_jobs: usize,
    finished_jobs: usize,
    last_completion: f64,
    ctx: SimulationContext,
}

impl Cluster {
    fn new(platform: Platform, queue: Rc<RefCell<JobQueue>>, ctx: SimulationContext) -> Self {
        let mut energy_meter = EnergyMeter::new();
        energy_meter.update(ctx.time(), platform.power());
        Self {
            platform,
            queue,
            energy_meter,
            pending_arrivals: 0,
            running_jobs: 0,
            finished_jobs: 0,
            last_completion: 0.,
            ctx,
        }
    }

    fn start_job(&mut self, job: &Job, cores: &[usize]) -> Result<(), FailReason> {
        self.platform.allocate(job, cores)?;
        log::debug!(
            "[{:.3}] job {} started on cores {:?}, req_time {:.3}",
            self.ctx.time(),
            job.id,
            cores,
            job.req_time
        );
        self.energy_meter.update(self.ctx.time(), self.platform.power());
        self.running_jobs += 1;
        self.ctx.emit_self(JobCompletion { job_id: job.id }, job.req_time);
        Ok(())
    }
}

impl EventHandler for Cluster {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            JobArrival { job } => {
                log::debug!("[{:.3}] job {} arrived", self.ctx.time(), job.id);
                self.pending_arrivals -= 1;
                self.queue.borrow_mut().submit(job);
            }
            JobCompletion { job_id } => {
                log::debug!("[{:.3}] job {} completed", self.ctx.time(), job_id);
                self.platform.release(job_id);
                self.running_jobs -= 1;
                self.finished_jobs += 1;
                self.last_completion = self.ctx.time();
                self.energy_meter.update(self.ctx.time(), self.platform.power());
            }
        })
    }
}

// SIMULATION ----------------------------------------------------------------------------------------------------------

/// Simulates job arrivals to the queue and job execution on the platform.
pub struct ClusterSimulation {
    sim: Simulation,
    cluster: Rc<RefCell<Cluster>>,
    job_limits: ResourceLimits,
}

impl ClusterSimulation {
    /// Creates the simulation of the workload which submits arriving jobs to `queue`.
    ///
    /// Job limits are computed over the whole workload.
    pub fn new(platform: Platform, jobs: Vec<Job>, queue: Rc<RefCell<JobQueue>>, seed: u64) -> Self {
        let job_limits = ResourceLimits::from_jobs(&jobs);
        let mut sim = Simulation::new(seed);
        let cluster_ctx = sim.create_context("cluster");
        let cluster = Rc::new(RefCell::new(Cluster::new(platform, queue, cluster_ctx)));
        let cluster_id = sim.add_handler("cluster", cluster.clone());

        let mut workload_ctx = sim.create_context("workload");
        cluster.borrow_mut().pending_arrivals = jobs.len();
        for job in jobs {
            let delay = job.submit_time;
            workload_ctx.emit(JobArrival { job }, cluster_id, delay);
        }
        Self {
            sim,
            cluster,
            job_limits,
        }
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.sim.time()
    }

    /// Returns the platform.
    pub fn platform(&self) -> Ref<'_, Platform> {
        Ref::map(self.cluster.borrow(), |cluster| &cluster.platform)
    }

    /// Returns the number of jobs currently running.
    pub fn running_jobs(&self) -> usize {
        self.cluster.borrow().running_jobs
    }

    /// Returns the number of completed jobs.
    pub fn finished_jobs(&self) -> usize {
        self.cluster.borrow().finished_jobs
    }

    /// Returns the time of the last job completion.
    pub fn makespan(&self) -> f64 {
        self.cluster.borrow().last_completion
    }

    /// Returns the energy consumed since the simulation start.
    pub fn energy_consumed(&self) -> f64 {
        self.cluster.borrow().energy_meter.energy_at(self.time())
    }

    /// Returns the number of power changes retained for computing recent energy consumption.
    pub fn energy_history_len(&self) -> usize {
        self.cluster.borrow().energy_meter.history_len()
    }

    /// Checks whether all jobs have arrived and completed.
    pub fn is_finished(&self) -> bool {
        let cluster = self.cluster.borrow();
        cluster.pending_arrivals == 0 && cluster.running_jobs == 0
    }

    /// Starts the job on the given cores, it completes after its requested time.
    pub fn start_job(&mut self, job: &Job, cores: &[usize]) -> Result<(), FailReason> {
        self.cluster.borrow_mut().start_job(job, cores)
    }

    /// Advances the time to the next event and processes all events at that time.
    ///
    /// Energy consumed before the last scheduling decision is forgotten afterwards.
    /// Returns `false` if there are no events.
    pub fn step(&mut self) -> bool {
        if !self.sim.step() {
            return false;
        }
        self.sim.step_for_duration(0.);
        let mut cluster = self.cluster.borrow_mut();
        let last_decision = cluster.queue.borrow().last_time();
        cluster.energy_meter.forget_before(last_decision);
        true
    }
}

impl Simulator for ClusterSimulation {
    fn simulation_time(&self) -> f64 {
        self.time()
    }

    /// Returns the energy actually consumed over the last `delta_time`, accounting for power changes.
    fn get_joules(&self, delta_time: f64) -> f64 {
        let cluster = self.cluster.borrow();
        let now = self.time();
        cluster.energy_meter.energy_at(now) - cluster.energy_meter.energy_at(now - delta_time)
    }

    fn job_limits(&self) -> ResourceLimits {
        self.job_limits
    }
}
