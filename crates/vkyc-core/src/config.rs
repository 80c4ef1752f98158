//! Configuración del motor.
//!
//! Umbrales, timeout de verificación y cadencia del guion de liveness son
//! configuración, no constantes. La carga desde entorno vive en el crate raíz.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::LivenessInstruction;

/// Umbrales de decisión (0..100) de las estrategias biométricas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub face_match: f64,
    pub liveness: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { face_match: 80.0,
               liveness: 85.0 }
    }
}

/// Política de reintentos por step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Intentos máximos por step (`None` = sin límite).
    pub max_attempts: Option<u32>,
    /// Escalar a revisión humana al agotar los intentos.
    pub auto_escalate: bool,
}

impl RetryPolicy {
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    pub verification_timeout: Duration,
    pub liveness_tick: Duration,
    pub liveness_script: Vec<LivenessInstruction>,
    /// Lecturas de frame antes de dar la cámara por no disponible.
    pub snapshot_attempts: u32,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { thresholds: Thresholds::default(),
               verification_timeout: Duration::from_secs(30),
               liveness_tick: Duration::from_secs(1),
               liveness_script: LivenessInstruction::standard_script(),
               snapshot_attempts: 3,
               retry: RetryPolicy::default() }
    }
}
