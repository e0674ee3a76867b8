//! Rewards for the supported optimization objectives.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::simulator::Simulator;
use crate::workload::WorkloadManager;

/// Optimization objective of the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Time span from the first job arrival until the last job completion.
    Makespan,
    /// Total energy consumed by the platform.
    EnergyConsumption,
    /// Product of the energy consumption and the makespan.
    Edp,
}

impl Objective {
    /// Computes the reward for the time elapsed since the last scheduling decision.
    pub fn reward(&self, simulator: &dyn Simulator, workload_manager: &dyn WorkloadManager) -> f64 {
        match self {
            Objective::Makespan => makespan_reward(simulator, workload_manager),
            Objective::EnergyConsumption => energy_consumption_reward(simulator, workload_manager),
            Objective::Edp => edp_reward(simulator, workload_manager),
        }
    }
}

/// Time elapsed since the last scheduling decision.
pub fn makespan_reward(simulator: &dyn Simulator, workload_manager: &dyn WorkloadManager) -> f64 {
    simulator.simulation_time() - workload_manager.last_time()
}

/// Negated energy consumed since the last scheduling decision.
pub fn energy_consumption_reward(simulator: &dyn Simulator, workload_manager: &dyn WorkloadManager) -> f64 {
    let delta_time = simulator.simulation_time() - workload_manager.last_time();
    -simulator.get_joules(delta_time)
}

/// Product of energy consumption and makespan rewards.
///
/// The energy reward is not positive, so the product is not positive either.
pub fn edp_reward(simulator: &dyn Simulator, workload_manager: &dyn WorkloadManager) -> f64 {
    energy_consumption_reward(simulator, workload_manager) * makespan_reward(simulator, workload_manager)
}
