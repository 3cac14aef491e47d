//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use dicebox::config::AppConfig;
use serial_test::serial;

#[test]
#[serial]
fn test_default_file_loading() {
    std::env::remove_var("DICEBOX_SIMULATION__GRAVITY");
    let config = AppConfig::load().unwrap();
    assert_eq!(config.simulation.gravity, -18.0);
    assert_eq!(config.roll.fallback_value, 1);
    assert_eq!(config.play_area.tiers.len(), 2);
}

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("DICEBOX_SIMULATION__GRAVITY", "-5.5");
    let config = AppConfig::load().unwrap();
    assert_eq!(config.simulation.gravity, -5.5);
    std::env::remove_var("DICEBOX_SIMULATION__GRAVITY");
}

#[test]
#[serial]
fn test_env_override_nested_roll_section() {
    std::env::set_var("DICEBOX_ROLL__MAX_REROLL_ATTEMPTS", "7");
    let config = AppConfig::load().unwrap();
    assert_eq!(config.roll.max_reroll_attempts, 7);
    std::env::remove_var("DICEBOX_ROLL__MAX_REROLL_ATTEMPTS");
}

#[test]
#[serial]
fn test_seed_absent_by_default() {
    let config = AppConfig::load().unwrap();
    assert_eq!(config.roll.seed, None);
}
