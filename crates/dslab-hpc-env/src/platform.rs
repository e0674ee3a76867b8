//! Model of a cluster platform: nodes with processors with cores.
//!
//! Nodes own memory, processors own memory bandwidth and define the peak compute capability of their cores,
//! cores consume static power all the time and additional dynamic power while running a job.
//! Memory and memory bandwidth of running jobs are accounted but not enforced.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::job::Job;
use crate::selection::CoreInfo;

// CONFIG --------------------------------------------------------------------------------------------------------------

/// Platform configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Node groups.
    pub nodes: Vec<NodeConfig>,
}

/// Configuration of a set of identical nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Number of such nodes (default: 1).
    pub count: Option<u32>,
    /// Node memory capacity.
    pub memory: f64,
    /// Processor groups of each node.
    pub processors: Vec<ProcessorConfig>,
}

/// Configuration of a set of identical processors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Number of such processors (default: 1).
    pub count: Option<u32>,
    /// Number of cores.
    pub cores: u32,
    /// Peak compute capability of each core in GFLOP/s.
    pub gflops_per_core: f64,
    /// Memory bandwidth of the processor.
    pub mem_bw: f64,
    /// Static power of each core in W.
    pub static_power: f64,
    /// Dynamic power of each core in W.
    pub dynamic_power: f64,
}

// STRUCTS -------------------------------------------------------------------------------------------------------------

/// Cluster node.
#[derive(Clone, Debug)]
pub struct Node {
    /// Memory capacity.
    pub max_mem: f64,
    /// Memory not used by running jobs.
    pub current_mem: f64,
    /// Ids of node processors.
    pub processors: Vec<usize>,
}

/// Processor of a node.
#[derive(Clone, Debug)]
pub struct Processor {
    /// Id of the owning node.
    pub node: usize,
    /// Peak compute capability of each core in GFLOP/s.
    pub gflops_per_core: f64,
    /// Memory bandwidth capacity.
    pub max_mem_bw: f64,
    /// Memory bandwidth not used by running jobs.
    pub current_mem_bw: f64,
    /// Ids of processor cores.
    pub cores: Vec<usize>,
}

/// Processor core.
#[derive(Clone, Debug)]
pub struct Core {
    /// Id of the owning processor.
    pub processor: usize,
    /// Static power in W.
    pub static_power: f64,
    /// Dynamic power in W.
    pub dynamic_power: f64,
    /// Id of the running job.
    pub job: Option<u64>,
}

/// Reason for allocation failure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum FailReason {
    /// No cores were requested.
    NoCores,
    /// Core does not exist or is already running a job.
    CoreUnavailable {
        /// Core id.
        core: usize,
    },
    /// Job already has an allocation.
    AlreadyAllocated {
        /// Job id.
        job: u64,
    },
}

#[derive(Clone, Debug)]
struct Allocation {
    cores: Vec<usize>,
    memory_per_core: f64,
    mem_bw_per_core: f64,
}

// MODEL ---------------------------------------------------------------------------------------------------------------

/// Cluster platform.
///
/// Cores are numbered consecutively in node, processor, core order.
#[derive(Clone, Debug)]
pub struct Platform {
    nodes: Vec<Node>,
    processors: Vec<Processor>,
    cores: Vec<Core>,
    allocations: HashMap<u64, Allocation>,
}

impl Platform {
    /// Creates the platform from config.
    pub fn new(config: &PlatformConfig) -> Self {
        let mut nodes = Vec::new();
        let mut processors = Vec::new();
        let mut cores = Vec::new();
        for node_config in &config.nodes {
            for _ in 0..node_config.count.unwrap_or(1) {
                let node_id = nodes.len();
                let mut node = Node {
                    max_mem: node_config.memory,
                    current_mem: node_config.memory,
                    processors: Vec::new(),
                };
                for proc_config in &node_config.processors {
                    for _ in 0..proc_config.count.unwrap_or(1) {
                        let proc_id = processors.len();
                        let core_ids = (cores.len()..cores.len() + proc_config.cores as usize).collect();
                        for _ in 0..proc_config.cores {
                            cores.push(Core {
                                processor: proc_id,
                                static_power: proc_config.static_power,
                                dynamic_power: proc_config.dynamic_power,
                                job: None,
                            });
                        }
                        processors.push(Processor {
                            node: node_id,
                            gflops_per_core: proc_config.gflops_per_core,
                            max_mem_bw: proc_config.mem_bw,
                            current_mem_bw: proc_config.mem_bw,
                            cores: core_ids,
                        });
                        node.processors.push(proc_id);
                    }
                }
                nodes.push(node);
            }
        }
        log::debug!(
            "platform: {} nodes, {} processors, {} cores",
            nodes.len(),
            processors.len(),
            cores.len()
        );
        Self {
            nodes,
            processors,
            cores,
            allocations: HashMap::new(),
        }
    }

    /// Returns the node by id.
    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    /// Returns the processor by id.
    pub fn processor(&self, id: usize) -> &Processor {
        &self.processors[id]
    }

    /// Returns the core by id.
    pub fn core(&self, id: usize) -> &Core {
        &self.cores[id]
    }

    /// Returns the total number of cores.
    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    /// Returns views of all cores.
    pub fn cores(&self) -> Vec<CoreRef<'_>> {
        (0..self.cores.len()).map(|id| CoreRef { platform: self, id }).collect()
    }

    /// Returns views of cores without a running job.
    pub fn idle_cores(&self) -> Vec<CoreRef<'_>> {
        self.cores().into_iter().filter(|core| core.core().job.is_none()).collect()
    }

    /// Returns the number of cores without a running job.
    pub fn idle_core_count(&self) -> usize {
        self.cores.iter().filter(|core| core.job.is_none()).count()
    }

    /// Returns the current power consumption in W.
    pub fn power(&self) -> f64 {
        self.cores
            .iter()
            .map(|core| match core.job {
                Some(_) => core.static_power + core.dynamic_power,
                None => core.static_power,
            })
            .sum()
    }

    /// Returns the energy in J consumed over `delta_time` at the current power.
    pub fn get_joules(&self, delta_time: f64) -> f64 {
        self.power() * delta_time
    }

    /// Runs the job on the given cores, splitting its memory and memory bandwidth evenly among them.
    ///
    /// Nothing is changed if the allocation fails.
    pub fn allocate(&mut self, job: &Job, cores: &[usize]) -> Result<(), FailReason> {
        if cores.is_empty() {
            return Err(FailReason::NoCores);
        }
        if self.allocations.contains_key(&job.id) {
            return Err(FailReason::AlreadyAllocated { job: job.id });
        }
        for (i, &core) in cores.iter().enumerate() {
            let available = self.cores.get(core).map_or(false, |c| c.job.is_none());
            if !available || cores[..i].contains(&core) {
                return Err(FailReason::CoreUnavailable { core });
            }
        }

        let allocation = Allocation {
            cores: cores.to_vec(),
            memory_per_core: job.memory / cores.len() as f64,
            mem_bw_per_core: job.memory_vol / cores.len() as f64,
        };
        for &core in cores {
            self.cores[core].job = Some(job.id);
            let processor = self.cores[core].processor;
            self.processors[processor].current_mem_bw -= allocation.mem_bw_per_core;
            let node = self.processors[processor].node;
            self.nodes[node].current_mem -= allocation.memory_per_core;
        }
        self.allocations.insert(job.id, allocation);
        Ok(())
    }

    /// Releases the resources used by the job, returns its cores.
    pub fn release(&mut self, job_id: u64) -> Option<Vec<usize>> {
        let allocation = self.allocations.remove(&job_id)?;
        for &core in &allocation.cores {
            self.cores[core].job = None;
            let processor = self.cores[core].processor;
            self.processors[processor].current_mem_bw += allocation.mem_bw_per_core;
            let node = self.processors[processor].node;
            self.nodes[node].current_mem += allocation.memory_per_core;
        }
        Some(allocation.cores)
    }
}

/// Core viewed together with its processor and node.
#[derive(Clone, Copy)]
pub struct CoreRef<'a> {
    platform: &'a Platform,
    id: usize,
}

impl<'a> CoreRef<'a> {
    /// Returns the core id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the core.
    pub fn core(&self) -> &'a Core {
        &self.platform.cores[self.id]
    }

    /// Returns the owning processor.
    pub fn processor(&self) -> &'a Processor {
        &self.platform.processors[self.core().processor]
    }

    /// Returns the owning node.
    pub fn node(&self) -> &'a Node {
        &self.platform.nodes[self.processor().node]
    }
}

impl CoreInfo for CoreRef<'_> {
    fn peak_gflops(&self) -> f64 {
        self.processor().gflops_per_core
    }

    fn processor_busy_cores(&self) -> usize {
        self.processor()
            .cores
            .iter()
            .filter(|&&core| self.platform.cores[core].job.is_some())
            .count()
    }

    fn node_current_mem(&self) -> f64 {
        self.node().current_mem
    }

    fn processor_current_mem_bw(&self) -> f64 {
        self.processor().current_mem_bw
    }

    fn static_power(&self) -> f64 {
        self.core().static_power
    }

    fn dynamic_power(&self) -> f64 {
        self.core().dynamic_power
    }
}
