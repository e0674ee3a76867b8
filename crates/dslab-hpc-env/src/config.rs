//! Environment configuration.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::observation::ObservationProfile;
use crate::reward::Objective;
use crate::selection::{CoreSelectorKey, JobSelectorKey};

/// Holds environment config as written in YAML.
///
/// Example:
///
/// ```yaml
/// objective: energy_consumption
/// queue_sensitivity: 0.05
/// observation: minimal
/// actions:
///   selection:
///     - shortest: [random, high_gflops]
///     - first: [low_power]
///   void: true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Objective name: `makespan`, `energy_consumption` or `edp`.
    pub objective: Option<String>,
    /// Sensitivity of the observation to job queue size variations.
    pub queue_sensitivity: Option<f64>,
    /// Observation profile: `minimal`, `small` or `normal` (default).
    pub observation: Option<String>,
    /// Subset of actions. The full action space is used if absent.
    pub actions: Option<RawActionsConfig>,
}

/// Holds the action subset as written in YAML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawActionsConfig {
    /// Ordered items mapping job selection names to lists of core selection names.
    pub selection: Option<Vec<IndexMap<String, Vec<String>>>>,
    /// Whether to append the void action.
    pub void: Option<bool>,
}

/// Validated environment settings.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvSettings {
    /// Reward objective.
    pub objective: Objective,
    /// Sensitivity of the observation to job queue size variations, positive.
    pub queue_sensitivity: f64,
    /// Observation profile.
    pub observation: ObservationProfile,
    /// Action subset, `None` means the full action space.
    pub actions: Option<ActionsConfig>,
}

/// Validated action subset.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionsConfig {
    /// Job selections paired with their core selections, in config order.
    pub selection: Vec<(JobSelectorKey, Vec<CoreSelectorKey>)>,
    /// Whether to append the void action.
    pub void: bool,
}

impl EnvConfig {
    /// Parses config from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Load {
            path: "<string>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Reads config from YAML file.
    pub fn from_file(file_name: &str) -> Result<Self, ConfigError> {
        let load_error = |reason: String| ConfigError::Load {
            path: file_name.to_string(),
            reason,
        };
        let yaml = std::fs::read_to_string(file_name).map_err(|e| load_error(e.to_string()))?;
        serde_yaml::from_str(&yaml).map_err(|e| load_error(e.to_string()))
    }

    /// Checks option values and resolves policy names.
    pub fn validate(&self) -> Result<EnvSettings, ConfigError> {
        let objective_name = self.objective.as_ref().ok_or(ConfigError::MissingOption("objective"))?;
        let objective = Objective::from_str(objective_name)
            .map_err(|_| ConfigError::UnknownObjective(objective_name.clone()))?;

        let queue_sensitivity = self
            .queue_sensitivity
            .ok_or(ConfigError::MissingOption("queue_sensitivity"))?;
        if !(queue_sensitivity.is_finite() && queue_sensitivity > 0.) {
            return Err(ConfigError::InvalidQueueSensitivity(queue_sensitivity));
        }

        let observation = match &self.observation {
            Some(name) => {
                ObservationProfile::from_str(name).map_err(|_| ConfigError::UnknownObservation(name.clone()))?
            }
            None => ObservationProfile::Normal,
        };

        let actions = self.actions.as_ref().map(RawActionsConfig::validate).transpose()?;

        Ok(EnvSettings {
            objective,
            queue_sensitivity,
            observation,
            actions,
        })
    }
}

impl RawActionsConfig {
    fn validate(&self) -> Result<ActionsConfig, ConfigError> {
        let items = self
            .selection
            .as_ref()
            .ok_or(ConfigError::MissingOption("actions.selection"))?;
        let void = self.void.ok_or(ConfigError::MissingOption("actions.void"))?;

        let mut selection = Vec::new();
        for item in items {
            for (job_name, core_names) in item {
                let job = JobSelectorKey::from_str(job_name)
                    .map_err(|_| ConfigError::UnknownJobSelection(job_name.clone()))?;
                let cores = core_names
                    .iter()
                    .map(|name| {
                        CoreSelectorKey::from_str(name).map_err(|_| ConfigError::UnknownCoreSelection(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                selection.push((job, cores));
            }
        }
        Ok(ActionsConfig { selection, void })
    }
}
