use crate::config::EnvConfig;
use crate::error::ConfigError;
use crate::observation::ObservationProfile;
use crate::reward::Objective;
use crate::selection::{CoreSelectorKey as C, JobSelectorKey as J};

fn validate(yaml: &str) -> Result<crate::config::EnvSettings, ConfigError> {
    EnvConfig::from_yaml(yaml)?.validate()
}

#[test]
fn test_full_config() {
    let settings = validate(
        r#"
objective: edp
queue_sensitivity: 0.05
observation: minimal
actions:
  selection:
    - shortest: [random, high_gflops]
    - first: [low_power]
  void: false
"#,
    )
    .unwrap();
    assert_eq!(settings.objective, Objective::Edp);
    assert_eq!(settings.queue_sensitivity, 0.05);
    assert_eq!(settings.observation, ObservationProfile::Minimal);
    let actions = settings.actions.unwrap();
    assert_eq!(
        actions.selection,
        vec![(J::Shortest, vec![C::Random, C::HighGflops]), (J::First, vec![C::LowPower])]
    );
    assert!(!actions.void);
}

#[test]
fn test_defaults() {
    let settings = validate("objective: makespan\nqueue_sensitivity: 1").unwrap();
    assert_eq!(settings.observation, ObservationProfile::Normal);
    assert_eq!(settings.actions, None);
}

#[test]
fn test_unknown_names() {
    assert_eq!(
        validate("objective: slowdown\nqueue_sensitivity: 1"),
        Err(ConfigError::UnknownObjective("slowdown".to_string()))
    );
    assert_eq!(
        validate("objective: makespan\nqueue_sensitivity: 1\nobservation: huge"),
        Err(ConfigError::UnknownObservation("huge".to_string()))
    );
    assert_eq!(
        validate(
            r#"
objective: makespan
queue_sensitivity: 1
actions:
  selection:
    - biggest: [random]
  void: true
"#
        ),
        Err(ConfigError::UnknownJobSelection("biggest".to_string()))
    );
    assert_eq!(
        validate(
            r#"
objective: makespan
queue_sensitivity: 1
actions:
  selection:
    - first: [random, fastest]
  void: true
"#
        ),
        Err(ConfigError::UnknownCoreSelection("fastest".to_string()))
    );
}

#[test]
fn test_missing_and_invalid_options() {
    assert_eq!(
        validate("queue_sensitivity: 1"),
        Err(ConfigError::MissingOption("objective"))
    );
    assert_eq!(
        validate("objective: edp"),
        Err(ConfigError::MissingOption("queue_sensitivity"))
    );
    assert_eq!(
        validate("objective: edp\nqueue_sensitivity: 0"),
        Err(ConfigError::InvalidQueueSensitivity(0.))
    );
    assert_eq!(
        validate("objective: edp\nqueue_sensitivity: -2"),
        Err(ConfigError::InvalidQueueSensitivity(-2.))
    );
    assert_eq!(
        validate("objective: edp\nqueue_sensitivity: .inf"),
        Err(ConfigError::InvalidQueueSensitivity(f64::INFINITY))
    );
    assert!(matches!(
        validate("objective: edp\nqueue_sensitivity: .nan"),
        Err(ConfigError::InvalidQueueSensitivity(s)) if s.is_nan()
    ));
    assert_eq!(
        validate("objective: edp\nqueue_sensitivity: 1\nactions:\n  selection: []"),
        Err(ConfigError::MissingOption("actions.void"))
    );
}

#[test]
fn test_unparsable_yaml() {
    assert!(matches!(
        EnvConfig::from_yaml("objective: [edp"),
        Err(ConfigError::Load { .. })
    ));
    assert!(matches!(
        EnvConfig::from_file("/nonexistent/env.yaml"),
        Err(ConfigError::Load { .. })
    ));
}
