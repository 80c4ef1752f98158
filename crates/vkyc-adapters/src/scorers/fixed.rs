use async_trait::async_trait;
use vkyc_core::{ImageBuffer, LivenessFrame, StrategyError};

use super::{FaceMatcher, LivenessScorer, TextExtractor};

/// Devuelve siempre el mismo puntaje.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedScore(pub f64);

#[async_trait]
impl LivenessScorer for FixedScore {
    async fn liveness(&self, _frames: &[LivenessFrame]) -> Result<f64, StrategyError> {
        Ok(self.0)
    }
}

#[async_trait]
impl FaceMatcher for FixedScore {
    async fn similarity(&self, _document: &ImageBuffer, _selfie: &ImageBuffer) -> Result<f64, StrategyError> {
        Ok(self.0)
    }
}

/// "Lee" exactamente el código esperado.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoText;

#[async_trait]
impl TextExtractor for EchoText {
    async fn extract(&self, _image: &ImageBuffer, expected: &str) -> Result<String, StrategyError> {
        Ok(expected.to_string())
    }
}

/// Devuelve siempre el mismo texto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedText(pub String);

#[async_trait]
impl TextExtractor for FixedText {
    async fn extract(&self, _image: &ImageBuffer, _expected: &str) -> Result<String, StrategyError> {
        Ok(self.0.clone())
    }
}

/// Backend caído: toda llamada falla.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unreachable;

#[async_trait]
impl LivenessScorer for Unreachable {
    async fn liveness(&self, _frames: &[LivenessFrame]) -> Result<f64, StrategyError> {
        Err(StrategyError::Backend("liveness backend unreachable".into()))
    }
}

#[async_trait]
impl FaceMatcher for Unreachable {
    async fn similarity(&self, _document: &ImageBuffer, _selfie: &ImageBuffer) -> Result<f64, StrategyError> {
        Err(StrategyError::Backend("face match backend unreachable".into()))
    }
}

#[async_trait]
impl TextExtractor for Unreachable {
    async fn extract(&self, _image: &ImageBuffer, _expected: &str) -> Result<String, StrategyError> {
        Err(StrategyError::Backend("ocr backend unreachable".into()))
    }
}

/// Nunca responde; para ejercitar el timeout de verificación.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stalled;

#[async_trait]
impl LivenessScorer for Stalled {
    async fn liveness(&self, _frames: &[LivenessFrame]) -> Result<f64, StrategyError> {
        std::future::pending().await
    }
}

#[async_trait]
impl FaceMatcher for Stalled {
    async fn similarity(&self, _document: &ImageBuffer, _selfie: &ImageBuffer) -> Result<f64, StrategyError> {
        std::future::pending().await
    }
}

#[async_trait]
impl TextExtractor for Stalled {
    async fn extract(&self, _image: &ImageBuffer, _expected: &str) -> Result<String, StrategyError> {
        std::future::pending().await
    }
}
