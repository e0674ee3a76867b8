//! Decision interface of an HPC job scheduling simulation.
//!
//! The [`environment::Environment`] exposes the state of a cluster as a fixed-size observation vector,
//! decodes discrete actions into pairs of job and core selection policies and computes rewards for
//! makespan, energy consumption and energy-delay product objectives.
//!
//! The environment reads the simulation only through the [`workload::WorkloadManager`] and
//! [`simulator::Simulator`] traits. The crate also provides simple implementations of these
//! collaborators ([`workload::JobQueue`], [`cluster::ClusterSimulation`]) along with a platform model
//! and an [`scheduler::ActionScheduler`] which applies decoded actions to the simulation.

#![warn(missing_docs)]

pub mod action;
pub mod cluster;
pub mod config;
pub mod environment;
pub mod error;
pub mod job;
pub mod observation;
pub mod platform;
pub mod reward;
pub mod scheduler;
pub mod selection;
pub mod simulator;
pub mod workload;

#[cfg(test)]
mod tests;
