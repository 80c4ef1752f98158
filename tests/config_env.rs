//! Lectura de configuración desde variables `VKYC_*`.

use std::collections::HashMap;
use std::time::Duration;

use vkycflow_rust::config::*;
use vkycflow_rust::{AppConfig, AppError};

fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
    let map: HashMap<&str, &str> = pairs.iter().copied().collect();
    AppConfig::from_vars(|name| map.get(name).map(|v| v.to_string()))
}

#[test]
fn engine_settings_are_read_from_variables() {
    let cfg = load(&[(FACE_MATCH_THRESHOLD, "72.5"),
                     (LIVENESS_THRESHOLD, "90"),
                     (VERIFICATION_TIMEOUT_MS, "5000"),
                     (LIVENESS_TICK_MS, "250"),
                     (SNAPSHOT_ATTEMPTS, "5"),
                     (MAX_ATTEMPTS, "3"),
                     (AUTO_ESCALATE, "true")]).expect("config");
    assert_eq!(cfg.engine.thresholds.face_match, 72.5);
    assert_eq!(cfg.engine.thresholds.liveness, 90.0);
    assert_eq!(cfg.engine.verification_timeout, Duration::from_secs(5));
    assert_eq!(cfg.engine.liveness_tick, Duration::from_millis(250));
    assert_eq!(cfg.engine.snapshot_attempts, 5);
    assert_eq!(cfg.engine.retry.max_attempts, Some(3));
    assert!(cfg.engine.retry.auto_escalate);
}

#[test]
fn simulation_settings_are_read_from_variables() {
    let cfg = load(&[(SIMULATION_SEED, "2024"),
                     (SIMULATION_PASS_RATE, "0.25"),
                     (SIMULATION_LATENCY_MS, "0")]).expect("config");
    assert_eq!(cfg.simulation.seed, 2024);
    assert_eq!(cfg.simulation.pass_rate, 0.25);
    assert_eq!(cfg.simulation.latency, Duration::ZERO);
}

#[test]
fn malformed_values_are_config_errors() {
    for (name, raw) in [(FACE_MATCH_THRESHOLD, "high"),
                        (LIVENESS_THRESHOLD, "101"),
                        (VERIFICATION_TIMEOUT_MS, "0"),
                        (SNAPSHOT_ATTEMPTS, "0"),
                        (MAX_ATTEMPTS, "-1"),
                        (AUTO_ESCALATE, "sometimes"),
                        (SIMULATION_PASS_RATE, "1.5")]
    {
        let err = load(&[(name, raw)]).expect_err(name);
        assert!(matches!(err, AppError::Config(ref msg) if msg.contains(name)), "{name}: {err}");
    }
}
