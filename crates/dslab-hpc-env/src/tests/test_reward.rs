use approx::assert_abs_diff_eq;

use crate::reward::*;
use crate::simulator::ResourceLimits;

use super::{StaticSimulator, StaticWorkload};

fn state(time: f64, last_time: f64, power: f64) -> (StaticSimulator, StaticWorkload) {
    (
        StaticSimulator {
            time,
            power,
            limits: ResourceLimits::default(),
        },
        StaticWorkload {
            jobs: Vec::new(),
            last_time,
        },
    )
}

#[test]
fn test_rewards() {
    // 5 J over 60 s
    let (sim, wm) = state(100., 40., 5. / 60.);
    assert_eq!(makespan_reward(&sim, &wm), 60.);
    assert_abs_diff_eq!(energy_consumption_reward(&sim, &wm), -5., epsilon = 1e-12);
    assert_abs_diff_eq!(edp_reward(&sim, &wm), -300., epsilon = 1e-9);

    assert_eq!(Objective::Makespan.reward(&sim, &wm), 60.);
    assert_abs_diff_eq!(Objective::EnergyConsumption.reward(&sim, &wm), -5., epsilon = 1e-12);
    assert_abs_diff_eq!(Objective::Edp.reward(&sim, &wm), -300., epsilon = 1e-9);
}

#[test]
fn test_edp_is_not_positive() {
    for (time, last_time, power) in [(10., 0., 3.), (10., 10., 3.), (7.5, 2., 0.), (1e6, 5., 1e3)] {
        let (sim, wm) = state(time, last_time, power);
        assert!(energy_consumption_reward(&sim, &wm) <= 0.);
        assert!(makespan_reward(&sim, &wm) >= 0.);
        assert!(edp_reward(&sim, &wm) <= 0.);
    }
}

#[test]
fn test_objective_names() {
    assert_eq!("makespan".parse::<Objective>().unwrap(), Objective::Makespan);
    assert_eq!(
        "energy_consumption".parse::<Objective>().unwrap(),
        Objective::EnergyConsumption
    );
    assert_eq!("edp".parse::<Objective>().unwrap(), Objective::Edp);
    assert!("slowdown".parse::<Objective>().is_err());
    assert_eq!(Objective::EnergyConsumption.to_string(), "energy_consumption");
}
