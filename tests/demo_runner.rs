//! Corridas de demostración completas sobre dispositivos simulados.

use std::time::Duration;

use vkyc_core::{EscalationReason, RunStatus, StepKind};
use vkycflow_rust::{run_demo, vkyc_registry, write_report, AppConfig, AppError, DemoOptions};

fn config(pass_rate: f64) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.simulation.pass_rate = pass_rate;
    cfg.simulation.latency = Duration::ZERO;
    cfg
}

#[test]
fn catalog_flow_has_the_four_steps_in_order() {
    let registry = vkyc_registry(&AppConfig::default()).expect("registry");
    assert_eq!(registry.ids(), vec!["face_liveness", "face_match", "handwriting", "location"]);
    assert!(registry.iter().all(|s| !s.title().is_empty() && !s.description().is_empty()));
}

#[tokio::test(start_paused = true)]
async fn passing_simulation_completes_the_flow() {
    let report = run_demo(&DemoOptions::default(), &config(1.0)).await.expect("demo");
    assert_eq!(report.status, RunStatus::Complete);
    assert!(report.run_fingerprint.is_some());
    assert!(report.devices_released);
    assert_eq!(report.event_variants.first(), Some(&"I"));
    assert_eq!(report.event_variants.last(), Some(&"C"));
    let last = report.snapshots.last().expect("snapshot");
    assert_eq!(last.completed_count, 4);
    assert_eq!(last.progress_percent, 100.0);
}

#[tokio::test(start_paused = true)]
async fn denied_location_falls_back_to_manual_address() {
    let opts = DemoOptions { deny_location: true,
                             ..DemoOptions::default() };
    let report = run_demo(&opts, &config(1.0)).await.expect("demo");
    assert_eq!(report.status, RunStatus::Complete);
    assert!(report.event_variants.contains(&"M"));
}

#[tokio::test(start_paused = true)]
async fn denied_camera_escalates_after_demo_attempts() {
    let opts = DemoOptions { deny_camera: true,
                             ..DemoOptions::default() };
    let report = run_demo(&opts, &config(1.0)).await.expect("demo");
    assert!(matches!(report.status, RunStatus::Escalated { reason: EscalationReason::Requested { .. } }));
    assert_eq!(report.event_variants.iter().filter(|v| **v == "X").count(), 3);
    assert!(report.run_fingerprint.is_none());
    assert!(report.devices_released);
}

#[tokio::test(start_paused = true)]
async fn retry_policy_auto_escalates() {
    let mut cfg = config(1.0);
    cfg.engine.retry.max_attempts = Some(2);
    cfg.engine.retry.auto_escalate = true;
    let opts = DemoOptions { deny_camera: true,
                             ..DemoOptions::default() };
    let report = run_demo(&opts, &cfg).await.expect("demo");
    assert!(matches!(report.status, RunStatus::Escalated { reason: EscalationReason::RetriesExhausted { attempts: 2, .. } }));
}

#[tokio::test(start_paused = true)]
async fn standalone_step_runs_alone() {
    let opts = DemoOptions { step: Some(StepKind::Handwriting),
                             seed: Some(5),
                             ..DemoOptions::default() };
    let report = run_demo(&opts, &config(1.0)).await.expect("demo");
    assert_eq!(report.status, RunStatus::Complete);
    assert_eq!(report.snapshots[0].total_steps, 1);
}

#[test]
fn location_page_completes_on_a_blocking_runtime() {
    let opts = DemoOptions { step: Some(StepKind::Location),
                             ..DemoOptions::default() };
    let report = tokio_test::block_on(run_demo(&opts, &config(0.0))).expect("demo");
    assert_eq!(report.status, RunStatus::Complete);
    assert_eq!(report.event_variants, vec!["I", "S", "V", "F", "A", "C"]);
}

#[tokio::test(start_paused = true)]
async fn report_is_written_as_json() {
    let opts = DemoOptions { step: Some(StepKind::Location),
                             ..DemoOptions::default() };
    let report = run_demo(&opts, &config(1.0)).await.expect("demo");
    let path = std::env::temp_dir().join(format!("vkyc-report-{}.json", report.run_id));
    write_report(&report, &path).expect("write");
    let raw = std::fs::read_to_string(&path).expect("read");
    let doc: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(doc["events"], "ISVFAC");
    assert_eq!(doc["status"]["status"], "complete");
    assert_eq!(doc["final_snapshot"]["completed_count"], 1);
    std::fs::remove_file(&path).expect("cleanup");
}

#[tokio::test(start_paused = true)]
async fn unwritable_report_path_is_an_io_error() {
    let opts = DemoOptions { step: Some(StepKind::Location),
                             ..DemoOptions::default() };
    let report = run_demo(&opts, &config(1.0)).await.expect("demo");
    let path = std::env::temp_dir().join(format!("vkyc-missing-{}", report.run_id)).join("run.json");
    let err = write_report(&report, &path).expect_err("missing directory");
    assert!(matches!(err, AppError::Io(_)));
}
