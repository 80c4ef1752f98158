//! Outcome de un intento de verificación.
//!
//! Un `Outcome` se produce una vez por intento y no se modifica después de
//! registrarse en el ledger; un reintento lo reemplaza por uno nuevo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeResult {
    Success,
    Failure,
}

/// Motivo de un outcome de fallo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// El usuario rechazó el acceso al dispositivo.
    PermissionDenied,
    /// No hay hardware compatible (o nunca entregó un frame).
    DeviceUnavailable,
    /// La estrategia decidió que la verificación no pasa.
    VerificationFailed,
    /// La estrategia no resolvió dentro del tiempo configurado.
    VerificationTimeout,
}

impl FailureReason {
    /// Fallos de acceso a dispositivo; habilitan la entrada manual cuando el
    /// step la soporta.
    pub fn is_permission_class(&self) -> bool {
        matches!(self, FailureReason::PermissionDenied | FailureReason::DeviceUnavailable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    result: OutcomeResult,
    confidence: Option<f64>,
    extracted_data: Option<Value>,
    reason: Option<FailureReason>,
    attempt: u32,
    recorded_at: DateTime<Utc>,
}

impl Outcome {
    pub fn success() -> Self {
        Self::new(OutcomeResult::Success, None)
    }

    pub fn failure(reason: FailureReason) -> Self {
        Self::new(OutcomeResult::Failure, Some(reason))
    }

    fn new(result: OutcomeResult, reason: Option<FailureReason>) -> Self {
        Self { result,
               confidence: None,
               extracted_data: None,
               reason,
               attempt: 0,
               recorded_at: Utc::now() }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_extracted_data(mut self, data: Value) -> Self {
        self.extracted_data = Some(data);
        self
    }

    /// Sella el outcome con el número de intento. Un fallo sin motivo pasa a
    /// `VerificationFailed`; un éxito nunca lleva motivo.
    pub(crate) fn sealed(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        match self.result {
            OutcomeResult::Success => self.reason = None,
            OutcomeResult::Failure => {
                self.reason.get_or_insert(FailureReason::VerificationFailed);
            }
        }
        self
    }

    pub fn result(&self) -> OutcomeResult {
        self.result
    }

    pub fn is_success(&self) -> bool {
        self.result == OutcomeResult::Success
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    pub fn extracted_data(&self) -> Option<&Value> {
        self.extracted_data.as_ref()
    }

    pub fn reason(&self) -> Option<FailureReason> {
        self.reason
    }

    /// Número de intento (1-based) que produjo este outcome.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealing_normalizes_reason() {
        let ok = Outcome::success().with_confidence(91.0).sealed(2);
        assert!(ok.is_success());
        assert_eq!(ok.reason(), None);
        assert_eq!(ok.attempt(), 2);

        let failed = Outcome::failure(FailureReason::VerificationTimeout).sealed(1);
        assert_eq!(failed.reason(), Some(FailureReason::VerificationTimeout));
    }

    #[test]
    fn permission_class_covers_device_access_only() {
        assert!(FailureReason::PermissionDenied.is_permission_class());
        assert!(FailureReason::DeviceUnavailable.is_permission_class());
        assert!(!FailureReason::VerificationTimeout.is_permission_class());
    }
}
