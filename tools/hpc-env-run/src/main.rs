use std::cell::RefCell;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use env_logger::Builder;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use dslab_hpc_env::action::Action;
use dslab_hpc_env::cluster::ClusterSimulation;
use dslab_hpc_env::config::EnvConfig;
use dslab_hpc_env::environment::Environment;
use dslab_hpc_env::platform::{Platform, PlatformConfig};
use dslab_hpc_env::scheduler::{ActionScheduler, Outcome};
use dslab_hpc_env::workload::{JobQueue, WorkloadConfig, WorkloadManager};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Runs a workload through the HPC environment with a random or fixed agent
struct Args {
    /// Path to YAML file with run configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Index of the action applied at every decision (default - random action)
    #[arg(short, long)]
    action: Option<i64>,

    /// Path to produced JSON file with run statistics (default - print to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Deserialize)]
struct RunConfig {
    #[serde(default)]
    seed: u64,
    platform: PlatformConfig,
    workload: WorkloadConfig,
    env: EnvConfig,
}

#[derive(Debug, Default, Serialize)]
struct RunStats {
    objective: String,
    steps: u64,
    decisions: u64,
    void_actions: u64,
    total_reward: f64,
    makespan: f64,
    energy: f64,
    finished_jobs: usize,
}

fn has_fitting_job(queue: &JobQueue, sim: &ClusterSimulation) -> bool {
    let idle_cores = sim.platform().idle_core_count();
    queue
        .pending_jobs()
        .iter()
        .any(|job| job.req_cores.max(1) as usize <= idle_cores)
}

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let config: RunConfig = serde_yaml::from_str(&std::fs::read_to_string(&args.config)?)?;

    let queue = Rc::new(RefCell::new(JobQueue::new()));
    let sim = Rc::new(RefCell::new(ClusterSimulation::new(
        Platform::new(&config.platform),
        config.workload.jobs()?,
        queue.clone(),
        config.seed,
    )));
    let mut env = Environment::new(&config.env, queue.clone(), sim.clone())?;
    if env.action_count() == 0 {
        return Err("action space is empty".into());
    }
    for (index, (job, core)) in env.action_space().actions().iter().enumerate() {
        log::debug!("action {}: {}/{}", index, job, core);
    }
    let mut scheduler = ActionScheduler::new(config.seed);
    let mut rng = Pcg64::seed_from_u64(config.seed);
    let mut stats = RunStats {
        objective: env.objective().to_string(),
        ..RunStats::default()
    };

    loop {
        let decide = has_fitting_job(&queue.borrow(), &sim.borrow());
        if decide {
            if stats.decisions > 0 {
                stats.total_reward += env.reward();
            }
            let observation = env.observation();
            let index = match args.action {
                Some(index) => index,
                None => rng.gen_range(0..env.action_count()) as i64,
            };
            let action = env.decode_action(index)?;
            log::trace!("observation {:?}, action {}", observation, action);
            let outcome = scheduler.apply(action, &mut queue.borrow_mut(), &mut sim.borrow_mut());
            stats.decisions += 1;
            if action == Action::Void {
                stats.void_actions += 1;
            }
            if let Outcome::Scheduled { .. } = outcome {
                continue;
            }
        }
        if !sim.borrow_mut().step() {
            break;
        }
        stats.steps += 1;
    }
    if stats.decisions > 0 {
        stats.total_reward += env.reward();
    }

    {
        let sim = sim.borrow();
        stats.makespan = sim.makespan();
        stats.energy = sim.energy_consumed();
        stats.finished_jobs = sim.finished_jobs();
    }
    log::info!(
        "finished {} jobs, {} still pending",
        stats.finished_jobs,
        queue.borrow().len()
    );

    let results = serde_json::to_string_pretty(&stats)?;
    match args.output {
        Some(path) => std::fs::File::create(path)?.write_all(results.as_bytes())?,
        None => println!("{}", results),
    }
    Ok(())
}
