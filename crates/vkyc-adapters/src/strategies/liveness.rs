use async_trait::async_trait;
use vkyc_core::{CaptureInput, CaptureRequirement, Challenge, Outcome, StrategyError, VerificationStrategy};

use super::decide;
use crate::scorers::LivenessScorer;

/// Liveness sobre los frames del guion center → left → right → hold.
#[derive(Debug)]
pub struct FaceLivenessStrategy<S> {
    scorer: S,
    threshold: f64,
}

impl<S: LivenessScorer> FaceLivenessStrategy<S> {
    pub fn new(scorer: S, threshold: f64) -> Self {
        Self { scorer, threshold }
    }
}

#[async_trait]
impl<S: LivenessScorer + std::fmt::Debug> VerificationStrategy for FaceLivenessStrategy<S> {
    fn requirement(&self) -> CaptureRequirement {
        CaptureRequirement::LivenessSequence
    }

    async fn verify(&self, input: &CaptureInput, _challenge: &Challenge) -> Result<Outcome, StrategyError> {
        let CaptureInput::LivenessFrames(frames) = input else {
            return Err(StrategyError::InvalidInput("liveness expects a frame sequence".into()));
        };
        if frames.is_empty() {
            return Err(StrategyError::InvalidInput("no liveness frames captured".into()));
        }
        let score = self.scorer.liveness(frames).await?;
        Ok(decide(score, self.threshold))
    }
}
