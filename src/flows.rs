//! Catálogo de flujos.
//!
//! `vkyc_registry` arma el flujo AI Agent VKYC de cuatro pasos y
//! `standalone_registry` las páginas de un solo paso. Ambos usan las
//! estrategias de `vkyc-adapters` sobre scorers simulados sembrados desde la
//! configuración; cada step recibe su propia semilla derivada.

use std::sync::Arc;
use std::time::Duration;

use vkyc_adapters::{FaceLivenessStrategy, FaceMatchStrategy, HandwritingStrategy, LocationStrategy, SimulatedScorer};
use vkyc_core::{CoreEngineError, StepDefinition, StepKind, StepRegistry};

use crate::config::AppConfig;

/// Orden del flujo AI Agent VKYC.
pub const VKYC_FLOW: [StepKind; 4] = [StepKind::FaceLiveness,
                                      StepKind::FaceMatch,
                                      StepKind::Handwriting,
                                      StepKind::Location];

fn scorer(cfg: &AppConfig, salt: u64) -> SimulatedScorer {
    let sim = &cfg.simulation;
    SimulatedScorer::new(sim.seed.wrapping_add(salt), sim.pass_rate, sim.latency)
}

/// Definición de un step del catálogo con su texto de presentación.
pub fn step_definition(kind: StepKind, cfg: &AppConfig) -> Result<StepDefinition, CoreEngineError> {
    let thresholds = cfg.engine.thresholds;
    let def = match kind {
        StepKind::FaceLiveness => {
            StepDefinition::new("face_liveness",
                                kind,
                                Arc::new(FaceLivenessStrategy::new(scorer(cfg, 1), thresholds.liveness)))
                .with_title("Face liveness")
                .with_description("Follow the on-screen prompts so we can confirm a live person is present.")
                .with_estimated_duration(Duration::from_secs(20))
        }
        StepKind::FaceMatch => {
            StepDefinition::new("face_match",
                                kind,
                                Arc::new(FaceMatchStrategy::new(scorer(cfg, 2), thresholds.face_match)))
                .with_title("Face match")
                .with_description("Show your identity document, then take a selfie to compare against it.")
                .with_estimated_duration(Duration::from_secs(30))
        }
        StepKind::Handwriting => {
            let seed = cfg.simulation.seed.wrapping_add(3);
            StepDefinition::new("handwriting",
                                kind,
                                Arc::new(HandwritingStrategy::seeded(scorer(cfg, 3), seed)))
                .with_title("Handwriting check")
                .with_description("Write the code shown on screen on paper and hold it up to the camera.")
                .with_estimated_duration(Duration::from_secs(45))
        }
        StepKind::Location => StepDefinition::new("location", kind, Arc::new(LocationStrategy))
            .with_title("Location")
            .with_description("Share your location, or enter your address if location access is blocked.")
            .with_estimated_duration(Duration::from_secs(10)),
        StepKind::Custom => {
            return Err(CoreEngineError::InvalidInput("custom steps are not part of the catalog".into()));
        }
    };
    Ok(def)
}

/// Flujo completo de cuatro pasos.
pub fn vkyc_registry(cfg: &AppConfig) -> Result<StepRegistry, CoreEngineError> {
    let steps = VKYC_FLOW.iter()
                         .map(|kind| step_definition(*kind, cfg))
                         .collect::<Result<Vec<_>, _>>()?;
    StepRegistry::new(steps)
}

/// Página independiente de un solo step.
pub fn standalone_registry(kind: StepKind, cfg: &AppConfig) -> Result<StepRegistry, CoreEngineError> {
    StepRegistry::new(vec![step_definition(kind, cfg)?])
}
