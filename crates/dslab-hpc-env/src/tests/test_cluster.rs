use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::action::Action;
use crate::cluster::ClusterSimulation;
use crate::error::ConfigError;
use crate::job::Job;
use crate::platform::{FailReason, NodeConfig, Platform, PlatformConfig, ProcessorConfig};
use crate::scheduler::{ActionScheduler, Outcome};
use crate::selection::{CoreInfo, CoreSelectorKey as C, JobSelectorKey as J};
use crate::simulator::Simulator;
use crate::workload::{generate_jobs, GeneratorConfig, JobQueue, WorkloadConfig, WorkloadManager};

// node 0: processor 0 (cores 0, 1)
// node 1: processor 1 (cores 2, 3), processor 2 (cores 4, 5)
fn platform_config() -> PlatformConfig {
    PlatformConfig {
        nodes: vec![
            NodeConfig {
                count: None,
                memory: 100.,
                processors: vec![ProcessorConfig {
                    count: None,
                    cores: 2,
                    gflops_per_core: 10.,
                    mem_bw: 50.,
                    static_power: 1.,
                    dynamic_power: 4.,
                }],
            },
            NodeConfig {
                count: Some(1),
                memory: 200.,
                processors: vec![ProcessorConfig {
                    count: Some(2),
                    cores: 2,
                    gflops_per_core: 20.,
                    mem_bw: 80.,
                    static_power: 2.,
                    dynamic_power: 8.,
                }],
            },
        ],
    }
}

fn simulation(jobs: Vec<Job>) -> (Rc<RefCell<JobQueue>>, ClusterSimulation) {
    let queue = Rc::new(RefCell::new(JobQueue::new()));
    let sim = ClusterSimulation::new(Platform::new(&platform_config()), jobs, queue.clone(), 123);
    (queue, sim)
}

// one node with two processors of four cores each
fn two_processor_config() -> PlatformConfig {
    PlatformConfig {
        nodes: vec![NodeConfig {
            count: None,
            memory: 100.,
            processors: vec![ProcessorConfig {
                count: Some(2),
                cores: 4,
                gflops_per_core: 10.,
                mem_bw: 50.,
                static_power: 1.,
                dynamic_power: 4.,
            }],
        }],
    }
}

fn schedule(job: J, core: C) -> Action {
    Action::Schedule { job, core }
}

#[test]
fn test_platform_structure() {
    let platform = Platform::new(&platform_config());
    assert_eq!(platform.core_count(), 6);
    assert_eq!(platform.core(1).processor, 0);
    assert_eq!(platform.core(3).processor, 1);
    assert_eq!(platform.core(4).processor, 2);
    assert_eq!(platform.processor(2).node, 1);
    assert_eq!(platform.node(1).processors, vec![1, 2]);
    assert_eq!(platform.idle_core_count(), 6);
    assert_eq!(platform.power(), 10.);
    assert_eq!(platform.get_joules(3.), 30.);
}

#[test]
fn test_allocation() {
    let mut platform = Platform::new(&platform_config());
    let job = Job::new(7, 0., 10., 2, 40., 20.);
    platform.allocate(&job, &[2, 4]).unwrap();
    assert_eq!(platform.core(2).job, Some(7));
    assert_eq!(platform.idle_core_count(), 4);
    assert_eq!(platform.node(1).current_mem, 160.);
    assert_eq!(platform.processor(1).current_mem_bw, 70.);
    assert_eq!(platform.processor(2).current_mem_bw, 70.);
    assert_eq!(platform.power(), 26.);

    let cores = platform.cores();
    assert_eq!(cores[3].processor_busy_cores(), 1);
    assert_eq!(cores[0].processor_busy_cores(), 0);
    assert_eq!(cores[5].node_current_mem(), 160.);
    assert_eq!(cores[5].processor_current_mem_bw(), 70.);
    assert_eq!(cores[5].peak_gflops(), 20.);
    assert_eq!(cores[0].static_power() + cores[0].dynamic_power(), 5.);
    let idle: Vec<usize> = platform.idle_cores().iter().map(|c| c.id()).collect();
    assert_eq!(idle, vec![0, 1, 3, 5]);

    assert_eq!(platform.release(7), Some(vec![2, 4]));
    assert_eq!(platform.release(7), None);
    assert_eq!(platform.node(1).current_mem, 200.);
    assert_eq!(platform.processor(1).current_mem_bw, 80.);
    assert_eq!(platform.power(), 10.);
}

#[test]
fn test_failed_allocation_keeps_state() {
    let mut platform = Platform::new(&platform_config());
    let job = Job::new(1, 0., 10., 1, 10., 10.);
    platform.allocate(&job, &[2]).unwrap();

    let other = Job::new(2, 0., 10., 2, 10., 10.);
    assert_eq!(platform.allocate(&other, &[]), Err(FailReason::NoCores));
    assert_eq!(
        platform.allocate(&other, &[0, 2]),
        Err(FailReason::CoreUnavailable { core: 2 })
    );
    assert_eq!(
        platform.allocate(&other, &[0, 0]),
        Err(FailReason::CoreUnavailable { core: 0 })
    );
    assert_eq!(
        platform.allocate(&other, &[99]),
        Err(FailReason::CoreUnavailable { core: 99 })
    );
    assert_eq!(platform.allocate(&job, &[3]), Err(FailReason::AlreadyAllocated { job: 1 }));
    assert_eq!(platform.core(0).job, None);
    assert_eq!(platform.idle_core_count(), 5);
    assert_eq!(platform.node(0).current_mem, 100.);
}

#[test]
fn test_simulation_events_and_energy() {
    let jobs = vec![Job::new(0, 0., 10., 2, 10., 10.), Job::new(1, 5., 2., 1, 10., 10.)];
    let (queue, mut sim) = simulation(jobs);
    assert_eq!(sim.job_limits().max_time, 10.);
    assert_eq!(sim.job_limits().max_core, 2.);

    assert!(sim.step());
    assert_eq!(sim.time(), 0.);
    assert_eq!(queue.borrow().len(), 1);
    let job = queue.borrow_mut().take(0);
    sim.start_job(&job, &[0, 1]).unwrap();
    assert_eq!(sim.platform().power(), 18.);
    assert_eq!(sim.running_jobs(), 1);

    assert!(sim.step());
    assert_eq!(sim.time(), 5.);
    assert_eq!(queue.borrow().pending_jobs()[0].id, 1);

    assert!(sim.step());
    assert_eq!(sim.time(), 10.);
    assert_eq!(sim.finished_jobs(), 1);
    assert_eq!(sim.running_jobs(), 0);
    assert_eq!(sim.makespan(), 10.);
    assert_eq!(sim.energy_consumed(), 180.);
    assert_eq!(sim.get_joules(10.), 180.);
    assert_eq!(sim.get_joules(3.), 54.);
    assert_eq!(sim.get_joules(0.), 0.);

    assert!(!sim.step());
    assert!(sim.is_finished());
}

#[test]
fn test_simultaneous_events_are_processed_together() {
    let jobs = (0..3).map(|i| Job::new(i, 1., 1., 1, 1., 1.)).collect();
    let (queue, mut sim) = simulation(jobs);
    assert!(sim.step());
    assert_eq!(sim.time(), 1.);
    let ids: Vec<u64> = queue.borrow().pending_jobs().iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert!(sim.is_finished());
}

#[test]
fn test_scheduler_applies_selections() {
    let jobs = vec![
        Job::new(0, 0., 10., 2, 10., 10.),
        Job::new(1, 0., 3., 2, 10., 10.),
        Job::new(2, 0., 1., 10, 10., 10.),
    ];
    let (queue, mut sim) = simulation(jobs);
    sim.step();
    let mut scheduler = ActionScheduler::new(123);

    // job 2 is the shortest but does not fit
    let outcome = scheduler.apply(schedule(J::Shortest, C::HighGflops), &mut queue.borrow_mut(), &mut sim);
    assert_eq!(outcome, Outcome::Scheduled { job: 1, cores: vec![2, 3] });

    let outcome = scheduler.apply(schedule(J::First, C::HighCores), &mut queue.borrow_mut(), &mut sim);
    assert_eq!(outcome, Outcome::Scheduled { job: 0, cores: vec![0, 1] });

    let outcome = scheduler.apply(schedule(J::Random, C::Random), &mut queue.borrow_mut(), &mut sim);
    assert_eq!(outcome, Outcome::NoFit);
    assert_eq!(queue.borrow().len(), 1);
    assert_eq!(sim.running_jobs(), 2);
}

#[test]
fn test_scheduler_core_policies() {
    let jobs = vec![Job::new(0, 0., 1., 1, 1., 1.), Job::new(1, 0., 1., 1, 1., 1.)];
    let (queue, mut sim) = simulation(jobs);
    sim.step();
    let mut scheduler = ActionScheduler::new(123);

    let outcome = scheduler.apply(schedule(J::First, C::HighMemBw), &mut queue.borrow_mut(), &mut sim);
    assert_eq!(outcome, Outcome::Scheduled { job: 0, cores: vec![2] });

    let outcome = scheduler.apply(schedule(J::First, C::LowPower), &mut queue.borrow_mut(), &mut sim);
    assert_eq!(outcome, Outcome::Scheduled { job: 1, cores: vec![0] });
}

#[test]
fn test_scheduler_records_decision_time() {
    let jobs = vec![Job::new(0, 4., 1., 1, 1., 1.)];
    let (queue, mut sim) = simulation(jobs);
    sim.step();
    let mut scheduler = ActionScheduler::new(123);
    let outcome = scheduler.apply(Action::Void, &mut queue.borrow_mut(), &mut sim);
    assert_eq!(outcome, Outcome::Skipped);
    assert_eq!(queue.borrow().len(), 1);
    assert_eq!(queue.borrow().last_time(), 4.);

    let outcome = scheduler.apply(schedule(J::Random, C::Random), &mut queue.borrow_mut(), &mut sim);
    assert!(matches!(outcome, Outcome::Scheduled { job: 0, ref cores } if cores.len() == 1));
    assert!(queue.borrow().is_empty());
}

#[test]
fn test_generated_workload() {
    let config = GeneratorConfig {
        count: 50,
        seed: 42,
        arrival_rate: 0.5,
        runtime: (1., 100.),
        cores: (1, 4),
        memory: (1., 64.),
        mem_bw: (1., 10.),
    };
    let jobs = generate_jobs(&config).unwrap();
    assert_eq!(jobs.len(), 50);
    assert_eq!(jobs, generate_jobs(&config).unwrap());
    for pair in jobs.windows(2) {
        assert!(pair[0].submit_time <= pair[1].submit_time);
    }
    for job in &jobs {
        assert!((1. ..=100.).contains(&job.req_time));
        assert!((1..=4).contains(&job.req_cores));
        assert!((1. ..=64.).contains(&job.memory));
        assert!((1. ..=10.).contains(&job.memory_vol));
    }
    assert_eq!(WorkloadConfig::Generate(config).jobs().unwrap(), jobs);
}

#[test]
fn test_invalid_generator_config() {
    let config = GeneratorConfig {
        count: 10,
        seed: 42,
        arrival_rate: 0.,
        runtime: (1., 100.),
        cores: (16, 1),
        memory: (1., 64.),
        mem_bw: (1., 10.),
    };
    assert_eq!(
        generate_jobs(&config),
        Err(ConfigError::InvalidRange {
            option: "cores",
            low: 16.,
            high: 1.
        })
    );
    assert!(WorkloadConfig::Generate(config.clone()).jobs().is_err());

    let config = GeneratorConfig {
        cores: (1, 16),
        memory: (1., f64::INFINITY),
        ..config
    };
    assert!(matches!(
        generate_jobs(&config),
        Err(ConfigError::InvalidRange { option: "memory", .. })
    ));

    let config = GeneratorConfig {
        memory: (1., 64.),
        arrival_rate: -1.,
        ..config
    };
    assert_eq!(generate_jobs(&config), Err(ConfigError::InvalidArrivalRate(-1.)));

    // all jobs arrive at once without arrival rate
    let config = GeneratorConfig {
        arrival_rate: 0.,
        ..config
    };
    let jobs = generate_jobs(&config).unwrap();
    assert!(jobs.iter().all(|job| job.submit_time == 0.));
}

#[test]
fn test_explicit_workload_is_sorted() {
    let workload = WorkloadConfig::Jobs(vec![Job::new(0, 5., 1., 1, 1., 1.), Job::new(1, 2., 1., 1, 1., 1.)]);
    let ids: Vec<u64> = workload.jobs().unwrap().iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![1, 0]);
}

#[test]
fn test_high_cores_prefers_loaded_processor() {
    let mut platform = Platform::new(&two_processor_config());
    platform.allocate(&Job::new(0, 0., 10., 3, 0., 0.), &[0, 1, 2]).unwrap();
    let idle = platform.idle_cores();
    let ids: Vec<usize> = idle.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![3, 4, 5, 6, 7]);
    assert_eq!(idle[0].processor_busy_cores(), 3);
    assert_eq!(idle[1].processor_busy_cores(), 0);
    let selected = C::HighCores.selection().select(&idle, &mut Pcg64::seed_from_u64(1));
    assert_eq!(selected, Some(0));

    let queue = Rc::new(RefCell::new(JobQueue::new()));
    let jobs = vec![Job::new(1, 0., 10., 2, 0., 0.)];
    let mut sim = ClusterSimulation::new(Platform::new(&two_processor_config()), jobs, queue.clone(), 123);
    sim.step();
    sim.start_job(&Job::new(0, 0., 10., 3, 0., 0.), &[0, 1, 2]).unwrap();
    let mut scheduler = ActionScheduler::new(123);
    let outcome = scheduler.apply(schedule(J::First, C::HighCores), &mut queue.borrow_mut(), &mut sim);
    assert_eq!(outcome, Outcome::Scheduled { job: 1, cores: vec![3, 4] });
}

#[test]
fn test_energy_history_is_bounded_by_decisions() {
    let jobs = (0..20).map(|i| Job::new(i, i as f64, 1.5, 1, 1., 1.)).collect();
    let (queue, mut sim) = simulation(jobs);
    let mut scheduler = ActionScheduler::new(123);
    let mut max_history = 0;
    while sim.step() {
        while !queue.borrow().is_empty() {
            let outcome = scheduler.apply(schedule(J::First, C::LowPower), &mut queue.borrow_mut(), &mut sim);
            assert!(matches!(outcome, Outcome::Scheduled { .. }));
        }
        max_history = max_history.max(sim.energy_history_len());
    }
    assert!(max_history <= 4, "{}", max_history);
    assert_eq!(sim.finished_jobs(), 20);
    assert_eq!(sim.makespan(), 20.5);
    // idle power over the whole run plus one low power core per job
    assert_abs_diff_eq!(sim.energy_consumed(), 10. * 20.5 + 20. * 1.5 * 4., epsilon = 1e-9);
    // jobs 18 and 19 overlap during [19, 19.5]
    assert_eq!(queue.borrow().last_time(), 19.);
    assert_abs_diff_eq!(sim.get_joules(1.5), 18. * 0.5 + 14. * 1., epsilon = 1e-9);
}
