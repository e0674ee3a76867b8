//! Environment for workload management.
//!
//! The environment is the agent's view of the simulation. For every decision step it provides an observation
//! of the job queue, decodes the action chosen by the agent into a pair of job and core selection policies
//! and, after the action is applied, computes the reward according to the agent's objective.
//!
//! The default action space is constituted by 37 actions, including the void action:
//!
//! | Job \ Core    | random | high_gflops | high_cores | high_mem | high_mem_bw | low_power |
//! |---------------|--------|-------------|------------|----------|-------------|-----------|
//! | `random`      | 0      | 1           | 2          | 3        | 4           | 5         |
//! | `first`       | 6      | 7           | 8          | 9        | 10          | 11        |
//! | `shortest`    | 12     | 13          | 14         | 15       | 16          | 17        |
//! | `smallest`    | 18     | 19          | 20         | 21       | 22          | 23        |
//! | `low_mem`     | 24     | 25          | 26         | 27       | 28          | 29        |
//! | `low_mem_ops` | 30     | 31          | 32         | 33       | 34          | 35        |
//! | void          | 36     |             |            |          |             |           |

use std::cell::RefCell;
use std::rc::Rc;

use crate::action::{Action, ActionSpace};
use crate::config::EnvConfig;
use crate::error::Error;
use crate::observation::ObservationBuilder;
use crate::reward::Objective;
use crate::simulator::Simulator;
use crate::workload::WorkloadManager;

/// Decision interface between an agent and the simulation.
pub struct Environment {
    workload_manager: Rc<RefCell<dyn WorkloadManager>>,
    simulator: Rc<RefCell<dyn Simulator>>,
    action_space: ActionSpace,
    observation: ObservationBuilder,
    objective: Objective,
}

impl Environment {
    /// Creates the environment, fails if the config is invalid.
    pub fn new(
        config: &EnvConfig,
        workload_manager: Rc<RefCell<dyn WorkloadManager>>,
        simulator: Rc<RefCell<dyn Simulator>>,
    ) -> Result<Self, Error> {
        let settings = config.validate()?;
        let action_space = ActionSpace::new(settings.actions.as_ref());
        let observation = ObservationBuilder::new(settings.observation, settings.queue_sensitivity);
        log::info!(
            "environment: {} actions (void: {}), {} observation of size {}, objective {}",
            action_space.action_count(),
            action_space.with_void(),
            observation.profile(),
            observation.size(),
            settings.objective
        );
        Ok(Self {
            workload_manager,
            simulator,
            action_space,
            observation,
            objective: settings.objective,
        })
    }

    /// Returns the number of actions.
    pub fn action_count(&self) -> usize {
        self.action_space.action_count()
    }

    /// Returns the action space.
    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    /// Returns the length of observations.
    pub fn observation_length(&self) -> usize {
        self.observation.size()
    }

    /// Returns the lower and upper bounds of observation entries.
    pub fn observation_bounds(&self) -> (Vec<f32>, Vec<f32>) {
        let size = self.observation_length();
        (vec![0.; size], vec![1.; size])
    }

    /// Returns the reward objective.
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Builds the current observation.
    ///
    /// Records the current job queue length for computing the variation ratio of the next observation.
    pub fn observation(&mut self) -> Vec<f32> {
        let workload_manager = self.workload_manager.borrow();
        let limits = self.simulator.borrow().job_limits();
        self.observation.build(workload_manager.pending_jobs(), &limits)
    }

    /// Computes the reward for the time since the last scheduling decision.
    pub fn reward(&self) -> f64 {
        let simulator = self.simulator.borrow();
        let workload_manager = self.workload_manager.borrow();
        self.objective.reward(&*simulator, &*workload_manager)
    }

    /// Maps the action index to the action.
    pub fn decode_action(&self, action: i64) -> Result<Action, Error> {
        let decoded = self.action_space.decode(action);
        if let Ok(decoded) = &decoded {
            log::trace!("action {} decoded as {}", action, decoded);
        }
        decoded
    }
}
