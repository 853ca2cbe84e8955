//! Tests for error types

use trueno_ab::{Error, Experiment, Registry};

#[test]
fn test_invalid_experiment_error() {
    let error = Error::InvalidExperiment {
        experiment_id: "hero".to_string(),
        reason: "at least one variant is required".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid experiment 'hero'"));
    assert!(error_str.contains("at least one variant"));
}

#[test]
fn test_config_error() {
    let error = Error::Config("registry JSON: expected value".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Configuration error"));
    assert!(error_str.contains("expected value"));
}

#[test]
fn test_registry_already_installed_error() {
    let error = Error::RegistryAlreadyInstalled;
    let error_str = format!("{error}");
    assert!(error_str.contains("already installed"));
    assert!(error_str.contains("load-once"));
}

#[test]
fn test_serialization_error_from_serde_json() {
    let serde_error = serde_json::from_str::<u32>("nope").unwrap_err();
    let error: Error = serde_error.into();
    assert!(format!("{error}").starts_with("Serialization error"));
}

#[test]
fn test_validation_errors_name_the_experiment() {
    let error = Experiment::builder("pricing")
        .variant("A", -2.0)
        .build()
        .unwrap_err();
    let error_str = format!("{error}");
    assert!(error_str.contains("'pricing'"));
    assert!(error_str.contains("weights must be positive"));

    let error = Registry::from_json(r#"{"x": {"variants": [], "extra": 1}}"#).unwrap_err();
    assert!(matches!(error, Error::Config(_)));
}

#[test]
fn test_error_debug() {
    let error = Error::RegistryAlreadyInstalled;
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("RegistryAlreadyInstalled"));
}
