//! Fixtures compartidas por los tests de integración.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vkyc_adapters::{DeviceProfile, EchoText, FaceLivenessStrategy, FaceMatchStrategy, FaceMatcher, FixedScore,
                    HandwritingStrategy, LocationStrategy, RecordingDevice, SimulatedDevice};
use vkyc_core::{EngineConfig, ImageBuffer, ManualScheduler, StepDefinition, StepKind, StrategyError, WorkflowEngine};

pub type Device = RecordingDevice<SimulatedDevice>;

/// Face matcher que devuelve los puntajes en orden y luego repite 99.
#[derive(Debug, Default)]
pub struct QueuedMatcher(Mutex<VecDeque<f64>>);

impl QueuedMatcher {
    pub fn new(scores: &[f64]) -> Self {
        Self(Mutex::new(scores.iter().copied().collect()))
    }
}

#[async_trait]
impl FaceMatcher for QueuedMatcher {
    async fn similarity(&self, _d: &ImageBuffer, _s: &ImageBuffer) -> Result<f64, StrategyError> {
        let next = self.0.lock().map_err(|e| StrategyError::Backend(e.to_string()))?.pop_front();
        Ok(next.unwrap_or(99.0))
    }
}

/// Flujo AI Agent VKYC con decisiones deterministas.
pub fn vkyc_steps(face_scores: &[f64]) -> Vec<StepDefinition> {
    vec![StepDefinition::new("face_liveness",
                             StepKind::FaceLiveness,
                             Arc::new(FaceLivenessStrategy::new(FixedScore(95.0), 85.0))),
         StepDefinition::new("face_match",
                             StepKind::FaceMatch,
                             Arc::new(FaceMatchStrategy::new(QueuedMatcher::new(face_scores), 80.0))),
         StepDefinition::new("handwriting",
                             StepKind::Handwriting,
                             Arc::new(HandwritingStrategy::seeded(EchoText, 42))),
         StepDefinition::new("location", StepKind::Location, Arc::new(LocationStrategy))]
}

pub struct Fixture {
    pub engine: WorkflowEngine,
    pub device: Arc<Device>,
    pub scheduler: Arc<ManualScheduler>,
}

pub fn fixture_with(steps: Vec<StepDefinition>, profile: DeviceProfile, config: EngineConfig) -> Fixture {
    let device = Arc::new(RecordingDevice::new(SimulatedDevice::new(profile)));
    let scheduler = Arc::new(ManualScheduler::new());
    let engine = WorkflowEngine::builder().steps(steps)
                                          .config(config)
                                          .device(device.clone())
                                          .scheduler(scheduler.clone())
                                          .build()
                                          .expect("engine");
    Fixture { engine,
              device,
              scheduler }
}

pub fn fixture(face_scores: &[f64], profile: DeviceProfile) -> Fixture {
    fixture_with(vkyc_steps(face_scores), profile, EngineConfig::default())
}
