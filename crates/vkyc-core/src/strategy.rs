//! Contrato de las estrategias de verificación.
//!
//! Una estrategia convierte la entrada capturada en un `Outcome`. El motor no
//! sabe si detrás hay un simulador, un modelo local o un servicio remoto; sólo
//! acota la llamada con un timeout.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{CaptureInput, Outcome};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StrategyError {
    /// La entrada no corresponde a lo que la estrategia necesita.
    #[error("invalid input: {0}")] InvalidInput(String),
    /// El backend de verificación falló.
    #[error("verification backend: {0}")] Backend(String),
}

/// Qué debe capturar la máquina de sub-estados antes de verificar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureRequirement {
    None,
    Selfie,
    /// Frames de la cámara frontal a lo largo del guion de liveness.
    LivenessSequence,
    DocumentAndSelfie,
    Document,
    /// Geolocalización, con dirección manual como alternativa.
    LocationOrManual,
}

impl CaptureRequirement {
    pub fn uses_camera(&self) -> bool {
        matches!(self,
                 CaptureRequirement::Selfie
                 | CaptureRequirement::LivenessSequence
                 | CaptureRequirement::DocumentAndSelfie
                 | CaptureRequirement::Document)
    }

    pub fn allows_manual_entry(&self) -> bool {
        matches!(self, CaptureRequirement::LocationOrManual)
    }
}

/// Desafío emitido al entrar en `intro` (por ejemplo el código que el usuario
/// debe escribir a mano). Se renueva en cada reintento.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Challenge {
    #[default]
    None,
    Code(String),
}

impl Challenge {
    pub fn code(&self) -> Option<&str> {
        match self {
            Challenge::Code(code) => Some(code),
            Challenge::None => None,
        }
    }
}

#[async_trait]
pub trait VerificationStrategy: Send + Sync + Debug {
    fn requirement(&self) -> CaptureRequirement;

    /// Desafío para un nuevo intento. Por defecto ninguno.
    fn issue_challenge(&self) -> Challenge {
        Challenge::None
    }

    /// Debe poder re-invocarse en cada reintento sin efectos acumulados.
    async fn verify(&self, input: &CaptureInput, challenge: &Challenge) -> Result<Outcome, StrategyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_location_offers_manual_entry() {
        assert!(CaptureRequirement::LocationOrManual.allows_manual_entry());
        assert!(!CaptureRequirement::LocationOrManual.uses_camera());
        assert!(CaptureRequirement::DocumentAndSelfie.uses_camera());
        assert!(!CaptureRequirement::None.uses_camera());
    }

    #[test]
    fn challenge_exposes_code() {
        assert_eq!(Challenge::Code("K7QX2M".into()).code(), Some("K7QX2M"));
        assert_eq!(Challenge::None.code(), None);
    }
}
