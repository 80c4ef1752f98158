//! Estrategias de verificación sobre scorers intercambiables.

mod face_match;
mod handwriting;
mod liveness;
mod location;

pub use face_match::FaceMatchStrategy;
pub use handwriting::HandwritingStrategy;
pub use liveness::FaceLivenessStrategy;
pub use location::LocationStrategy;

use vkyc_core::{FailureReason, Outcome};

/// Éxito iff `score >= threshold`; el puntaje viaja como confianza.
pub(crate) fn decide(score: f64, threshold: f64) -> Outcome {
    let outcome = if score >= threshold {
        Outcome::success()
    } else {
        Outcome::failure(FailureReason::VerificationFailed)
    };
    outcome.with_confidence(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        assert!(decide(80.0, 80.0).is_success());
        assert!(!decide(79.99, 80.0).is_success());
        assert_eq!(decide(42.0, 80.0).confidence(), Some(42.0));
    }
}
