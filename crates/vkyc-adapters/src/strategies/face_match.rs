use async_trait::async_trait;
use vkyc_core::{CaptureInput, CaptureRequirement, Challenge, Outcome, StrategyError, VerificationStrategy};

use super::decide;
use crate::scorers::FaceMatcher;

/// Compara la foto del documento con la selfie.
#[derive(Debug)]
pub struct FaceMatchStrategy<M> {
    matcher: M,
    threshold: f64,
}

impl<M: FaceMatcher> FaceMatchStrategy<M> {
    pub fn new(matcher: M, threshold: f64) -> Self {
        Self { matcher, threshold }
    }
}

#[async_trait]
impl<M: FaceMatcher + std::fmt::Debug> VerificationStrategy for FaceMatchStrategy<M> {
    fn requirement(&self) -> CaptureRequirement {
        CaptureRequirement::DocumentAndSelfie
    }

    async fn verify(&self, input: &CaptureInput, _challenge: &Challenge) -> Result<Outcome, StrategyError> {
        let CaptureInput::DocumentAndSelfie { document, selfie } = input else {
            return Err(StrategyError::InvalidInput("face match expects document and selfie".into()));
        };
        if document.is_empty() || selfie.is_empty() {
            return Err(StrategyError::InvalidInput("empty image".into()));
        }
        let similarity = self.matcher.similarity(document, selfie).await?;
        Ok(decide(similarity, self.threshold))
    }
}
