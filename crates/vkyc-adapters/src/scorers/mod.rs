//! Contratos de puntaje usados por las estrategias.
//!
//! Los puntajes biométricos van de 0 a 100. Las implementaciones fijas sirven
//! para tests deterministas; `SimulatedScorer` reemplaza a los servicios
//! reales en la demo.

use async_trait::async_trait;
use vkyc_core::{ImageBuffer, LivenessFrame, StrategyError};

mod fixed;
mod simulated;

pub use fixed::{EchoText, FixedScore, FixedText, Stalled, Unreachable};
pub use simulated::SimulatedScorer;

#[async_trait]
pub trait LivenessScorer: Send + Sync {
    async fn liveness(&self, frames: &[LivenessFrame]) -> Result<f64, StrategyError>;
}

#[async_trait]
pub trait FaceMatcher: Send + Sync {
    async fn similarity(&self, document: &ImageBuffer, selfie: &ImageBuffer) -> Result<f64, StrategyError>;
}

/// OCR de texto manuscrito. `expected` es el código emitido; un backend real
/// lo ignora, los simuladores lo usan para decidir qué "leen".
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, image: &ImageBuffer, expected: &str) -> Result<String, StrategyError>;
}
