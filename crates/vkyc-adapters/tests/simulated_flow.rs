//! Tests de integración: estrategias simuladas detrás del motor.

use std::sync::Arc;
use std::time::Duration;

use vkyc_adapters::{DeviceProfile, FaceLivenessStrategy, FaceMatchStrategy, HandwritingStrategy, LocationStrategy,
                    RecordingDevice, SimulatedDevice, SimulatedScorer, Unreachable};
use vkyc_core::{FailureReason, ManualScheduler, RunStatus, StepDefinition, StepKind, WorkflowEngine};

fn steps(seed: u64, pass_rate: f64) -> Vec<StepDefinition> {
    let scorer = || SimulatedScorer::new(seed, pass_rate, Duration::ZERO);
    vec![StepDefinition::new("face_liveness",
                             StepKind::FaceLiveness,
                             Arc::new(FaceLivenessStrategy::new(scorer(), 85.0))),
         StepDefinition::new("face_match",
                             StepKind::FaceMatch,
                             Arc::new(FaceMatchStrategy::new(scorer(), 80.0))),
         StepDefinition::new("handwriting",
                             StepKind::Handwriting,
                             Arc::new(HandwritingStrategy::seeded(scorer(), seed))),
         StepDefinition::new("location", StepKind::Location, Arc::new(LocationStrategy))]
}

async fn run(seed: u64, pass_rate: f64) -> (RunStatus, Vec<&'static str>) {
    let device = Arc::new(RecordingDevice::new(SimulatedDevice::new(DeviceProfile::default())));
    let mut engine = WorkflowEngine::builder().steps(steps(seed, pass_rate))
                                              .device(device.clone())
                                              .scheduler(Arc::new(ManualScheduler::new()))
                                              .build()
                                              .expect("engine");
    engine.start().expect("start");
    while engine.status() == RunStatus::InProgress {
        let outcome = engine.capture().await.expect("capture");
        if outcome.is_success() {
            engine.advance().expect("advance");
        } else if engine.retry_current_step().is_err() {
            break;
        }
        if engine.events().len() > 200 {
            break;
        }
    }
    assert!(device.acquire_release_balanced());
    (engine.status(), engine.event_variants())
}

#[tokio::test]
async fn always_passing_simulation_completes() {
    let (status, variants) = run(9, 1.0).await;
    assert_eq!(status, RunStatus::Complete);
    assert_eq!(variants.iter().filter(|v| **v == "X").count(), 0);
}

#[tokio::test]
async fn same_seed_same_event_sequence() {
    let a = run(2024, 0.6).await;
    let b = run(2024, 0.6).await;
    assert_eq!(a.1, b.1);
}

#[tokio::test]
async fn backend_errors_become_verification_failures() {
    let device = Arc::new(SimulatedDevice::new(DeviceProfile::default()));
    let mut engine = WorkflowEngine::builder().step(StepDefinition::new("face_match",
                                                                        StepKind::FaceMatch,
                                                                        Arc::new(FaceMatchStrategy::new(Unreachable,
                                                                                                        80.0))))
                                              .device(device.clone())
                                              .scheduler(Arc::new(ManualScheduler::new()))
                                              .build()
                                              .expect("engine");
    engine.start().expect("start");
    let outcome = engine.capture().await.expect("capture");
    assert_eq!(outcome.reason(), Some(FailureReason::VerificationFailed));
    assert_eq!(device.open_handles(), 0);
}
