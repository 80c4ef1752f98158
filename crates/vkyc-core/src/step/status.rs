use serde::{Deserialize, Serialize};

use crate::model::OutcomeResult;

/// Sub-estado del step activo.
///
/// Las transiciones válidas son:
/// - `Intro` -> `Capturing` -> `Processing` -> `Result`
/// - `Capturing` -> `Result(Failure)` (fallo de dispositivo)
/// - `Result(Failure)` -> `Processing` (entrada manual, sólo location)
/// - `Result(Failure)` -> `Intro` (reintento explícito)
/// - `Capturing`/`Processing` -> `Intro` (intento cancelado)
///
/// `Result(Success)` es terminal para el intento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "result", rename_all = "snake_case")]
pub enum SubState {
    Intro,
    Capturing,
    Processing,
    Result(OutcomeResult),
}

impl SubState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubState::Capturing | SubState::Processing)
    }
}
