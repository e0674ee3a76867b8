//! Discrete action space built from pairs of job and core selection policies.

use std::fmt::{Display, Formatter};

use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::config::ActionsConfig;
use crate::error::Error;
use crate::selection::{CoreSelectorKey, JobSelectorKey};

/// Decoded scheduling action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Select a pending job with `job` policy and map it to cores selected with `core` policy.
    Schedule {
        /// Job selection policy.
        job: JobSelectorKey,
        /// Core selection policy.
        core: CoreSelectorKey,
    },
    /// Perform no assignment at this step.
    Void,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Schedule { job, core } => write!(f, "{}/{}", job, core),
            Action::Void => write!(f, "void"),
        }
    }
}

/// Ordered list of actions, each identified by its index.
///
/// The mapping from indices to actions does not change after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionSpace {
    actions: Vec<(JobSelectorKey, CoreSelectorKey)>,
    with_void: bool,
}

impl ActionSpace {
    /// Builds the full cross product of job and core policies in declaration order with the void action.
    pub fn full() -> Self {
        let actions = JobSelectorKey::iter()
            .cartesian_product(CoreSelectorKey::iter())
            .collect();
        Self {
            actions,
            with_void: true,
        }
    }

    /// Builds the action space from a validated config, or the full space if there is no config.
    pub fn new(config: Option<&ActionsConfig>) -> Self {
        match config {
            Some(config) => Self {
                actions: config
                    .selection
                    .iter()
                    .flat_map(|(job, cores)| cores.iter().map(move |core| (*job, *core)))
                    .collect(),
                with_void: config.void,
            },
            None => Self::full(),
        }
    }

    /// Returns the total number of actions including the void action.
    pub fn action_count(&self) -> usize {
        self.actions.len() + self.with_void as usize
    }

    /// Checks whether the last action is the void action.
    pub fn with_void(&self) -> bool {
        self.with_void
    }

    /// Returns the non-void actions in index order.
    pub fn actions(&self) -> &[(JobSelectorKey, CoreSelectorKey)] {
        &self.actions
    }

    /// Maps an action index to the action.
    pub fn decode(&self, index: i64) -> Result<Action, Error> {
        let out_of_range = Error::ActionOutOfRange {
            action: index,
            action_count: self.action_count(),
        };
        let index = usize::try_from(index).map_err(|_| out_of_range.clone())?;
        if let Some(&(job, core)) = self.actions.get(index) {
            Ok(Action::Schedule { job, core })
        } else if self.with_void && index == self.actions.len() {
            Ok(Action::Void)
        } else {
            Err(out_of_range)
        }
    }
}
