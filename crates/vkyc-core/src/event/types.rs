//! Tipos de evento del workflow y estructura `FlowEvent`.
//!
//! Rol en el flujo:
//! - Cada comando del `WorkflowEngine` que cambia estado emite eventos a un
//!   `EventStore` append-only.
//! - Los eventos son el registro auditable de una corrida: intentos, motivos
//!   de fallo, navegación y cierre.
//! - El enum `FlowEventKind` define el contrato observable y estable del motor.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::FailureReason;

/// Motivo de un escalamiento a revisión humana.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EscalationReason {
    /// Pedido explícito (usuario u operador).
    Requested { note: String },
    /// La política de reintentos se agotó en un step.
    RetriesExhausted { step_id: String, attempts: u32 },
}

impl EscalationReason {
    pub fn requested(note: impl Into<String>) -> Self {
        Self::Requested { note: note.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlowEventKind {
    /// Primer evento de una corrida: fija la `definition_hash` y cantidad de
    /// steps.
    RunStarted { definition_hash: String, step_count: usize },
    /// Comienza un intento. `manual` indica dirección ingresada a mano.
    CaptureStarted {
        step_index: usize,
        step_id: String,
        attempt: u32,
        manual: bool,
    },
    /// La captura terminó y la estrategia está verificando.
    VerificationStarted { step_index: usize, step_id: String },
    StepSucceeded {
        step_index: usize,
        step_id: String,
        attempt: u32,
        confidence: Option<f64>,
    },
    /// Fallo de dispositivo o de verificación; el step queda en
    /// `Result(Failure)`.
    StepFailed {
        step_index: usize,
        step_id: String,
        attempt: u32,
        reason: FailureReason,
    },
    RetryRequested { step_index: usize, step_id: String },
    /// `to_index = None` cuando el avance completa la corrida.
    StepAdvanced { from_index: usize, to_index: Option<usize> },
    StepRevisited { from_index: usize, to_index: usize },
    /// Cierre con fingerprint agregado de la corrida.
    RunCompleted { run_fingerprint: String },
    RunEscalated { step_index: Option<usize>, reason: EscalationReason },
    RunAbandoned { step_index: Option<usize> },
    /// La corrida se reconstruyó desde un snapshot persistido.
    RunRestored { completed_count: usize },
}

impl FlowEventKind {
    /// Código compacto para aserciones de secuencia.
    pub fn code(&self) -> &'static str {
        match self {
            FlowEventKind::RunStarted { .. } => "I",
            FlowEventKind::CaptureStarted { manual: false, .. } => "S",
            FlowEventKind::CaptureStarted { manual: true, .. } => "M",
            FlowEventKind::VerificationStarted { .. } => "V",
            FlowEventKind::StepSucceeded { .. } => "F",
            FlowEventKind::StepFailed { .. } => "X",
            FlowEventKind::RetryRequested { .. } => "R",
            FlowEventKind::StepAdvanced { .. } => "A",
            FlowEventKind::StepRevisited { .. } => "B",
            FlowEventKind::RunCompleted { .. } => "C",
            FlowEventKind::RunEscalated { .. } => "E",
            FlowEventKind::RunAbandoned { .. } => "Q",
            FlowEventKind::RunRestored { .. } => "L",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEvent {
    pub seq: u64, // asignado por el EventStore (orden append)
    pub run_id: Uuid,
    pub kind: FlowEventKind,
    pub ts: DateTime<Utc>,
}
