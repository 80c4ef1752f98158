//! Errores del orquestador.
//!
//! Sólo representan un mal uso de la superficie de comandos (por ejemplo
//! `advance()` antes de un éxito). Los fallos de dispositivo o de verificación
//! nunca llegan aquí: la máquina de sub-estados los convierte en un
//! `Outcome` de fallo.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreEngineError {
    #[error("workflow run not started")] NotStarted,
    #[error("workflow run already terminated")] RunTerminated,
    #[error("current step has no successful outcome")] StepNotSuccessful,
    #[error("step already succeeded")] StepAlreadySucceeded,
    #[error("step attempt already in flight")] StepBusy,
    #[error("no previous step")] NoPreviousStep,
    #[error("step does not accept manual entry")] ManualEntryUnsupported,
    #[error("invalid input: {0}")] InvalidInput(String),
    #[error("retry limit reached for step")] RetryLimitReached,
    #[error("step registry is empty")] EmptyRegistry,
    #[error("duplicate step id: {0}")] DuplicateStepId(String),
    #[error("persisted run does not match the step registry")] SnapshotMismatch,
    #[error("persistence: {0}")] Persistence(String),
    #[error("internal: {0}")] Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message_carries_detail() {
        let err = CoreEngineError::InvalidInput("missing city".into());
        assert_eq!(err.to_string(), "invalid input: missing city");
    }

    #[test]
    fn errors_serialize_for_event_payloads() {
        let err = CoreEngineError::DuplicateStepId("face_match".into());
        let raw = serde_json::to_string(&err).expect("serialize");
        let back: CoreEngineError = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back, err);
    }
}
