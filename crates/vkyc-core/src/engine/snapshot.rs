//! Vista de sólo lectura del workflow y puerto de persistencia.
//!
//! `WorkflowSnapshot` es lo único que la capa de presentación consume.
//! `PersistedRun` es la forma serializable de una corrida (cursor, intentos y
//! ledger) y `SnapshotStore` el único puerto por el que cruza estado entre
//! sesiones.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::SNAPSHOT_SCHEMA_VERSION;
use crate::errors::CoreEngineError;
use crate::event::EscalationReason;
use crate::model::{FailureReason, LivenessInstruction, OutcomeResult};
use crate::repo::{ResultLedger, StepRegistry};
use crate::step::{ArtifactRef, Notice, StepKind, StepMachine, SubState};
use crate::strategy::Challenge;

/// Posición de la corrida: un step, o uno de los dos terminales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum Cursor {
    Step { index: usize },
    Complete,
    Escalated { from: Option<usize>, reason: EscalationReason },
}

impl Cursor {
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Cursor::Step { index } => Some(*index),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Cursor::Step { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    NotStarted,
    InProgress,
    Complete,
    Escalated { reason: EscalationReason },
}

/// Step activo tal como lo ve la presentación.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepView {
    pub index: usize,
    pub step_id: String,
    pub kind: StepKind,
    pub title: String,
    pub description: String,
    /// Duración orientativa del step.
    pub estimated_duration: Duration,
    pub sub_state: SubState,
    pub instruction: Option<LivenessInstruction>,
    pub instruction_message: Option<String>,
    pub challenge: Challenge,
    pub notice: Option<Notice>,
    pub artifacts: Vec<ArtifactRef>,
    pub attempts: u32,
    pub manual_entry_available: bool,
}

/// Una fila del ledger, en orden de registro (steps sin outcome incluidos).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub step_id: String,
    pub result: Option<OutcomeResult>,
    pub reason: Option<FailureReason>,
    pub confidence: Option<f64>,
    pub attempt: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub run_id: Option<Uuid>,
    pub definition_hash: String,
    pub status: RunStatus,
    pub current_step_index: Option<usize>,
    pub current: Option<StepView>,
    pub ledger: Vec<LedgerEntry>,
    pub completed_count: usize,
    pub total_steps: usize,
    pub progress_percent: f64,
}

/// Partes de una corrida necesarias para componer un snapshot.
pub(crate) struct RunView<'a> {
    pub run_id: Uuid,
    pub cursor: &'a Cursor,
    pub ledger: &'a ResultLedger,
    pub attempts: &'a [u32],
    pub machine: Option<&'a StepMachine>,
}

pub(crate) fn progress_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

pub(crate) fn compose(registry: &StepRegistry, run: Option<RunView<'_>>) -> WorkflowSnapshot {
    let total_steps = registry.len();
    let Some(run) = run else {
        return WorkflowSnapshot { run_id: None,
                                  definition_hash: registry.definition_hash().to_string(),
                                  status: RunStatus::NotStarted,
                                  current_step_index: None,
                                  current: None,
                                  ledger: Vec::new(),
                                  completed_count: 0,
                                  total_steps,
                                  progress_percent: 0.0 };
    };

    let ledger = registry.iter()
                         .map(|def| {
                             let outcome = run.ledger.get(def.id());
                             LedgerEntry { step_id: def.id().to_string(),
                                           result: outcome.map(|o| o.result()),
                                           reason: outcome.and_then(|o| o.reason()),
                                           confidence: outcome.and_then(|o| o.confidence()),
                                           attempt: outcome.map(|o| o.attempt()) }
                         })
                         .collect();
    let completed_count = run.ledger.completed_count(registry);
    let status = match run.cursor {
        Cursor::Step { .. } => RunStatus::InProgress,
        Cursor::Complete => RunStatus::Complete,
        Cursor::Escalated { reason, .. } => RunStatus::Escalated { reason: reason.clone() },
    };
    let current = run.machine.and_then(|m| {
                                 let def = registry.get(m.index())?;
                                 let rt = m.runtime();
                                 Some(StepView { index: m.index(),
                                                 step_id: m.step_id().to_string(),
                                                 kind: def.kind(),
                                                 title: def.title().to_string(),
                                                 description: def.description().to_string(),
                                                 estimated_duration: def.estimated_duration(),
                                                 sub_state: m.sub_state(),
                                                 instruction: rt.instruction(),
                                                 instruction_message: rt.instruction().map(|i| i.message().to_string()),
                                                 challenge: rt.challenge().clone(),
                                                 notice: rt.notice().cloned(),
                                                 artifacts: rt.artifacts(),
                                                 attempts: run.attempts.get(m.index()).copied().unwrap_or(0),
                                                 manual_entry_available: def.requirement().allows_manual_entry() })
                             });

    WorkflowSnapshot { run_id: Some(run.run_id),
                       definition_hash: registry.definition_hash().to_string(),
                       status,
                       current_step_index: run.cursor.step_index(),
                       current,
                       ledger,
                       completed_count,
                       total_steps,
                       progress_percent: progress_percent(completed_count, total_steps) }
}

/// Forma persistible de una corrida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRun {
    pub schema_version: u32,
    pub definition_hash: String,
    pub run_id: Uuid,
    pub cursor: Cursor,
    pub attempts: Vec<u32>,
    pub outcomes: ResultLedger,
}

impl PersistedRun {
    pub(crate) fn new(definition_hash: String, run_id: Uuid, cursor: Cursor, attempts: Vec<u32>, outcomes: ResultLedger) -> Self {
        Self { schema_version: SNAPSHOT_SCHEMA_VERSION,
               definition_hash,
               run_id,
               cursor,
               attempts,
               outcomes }
    }

    /// Resumen `step_id → result`.
    pub fn results(&self) -> BTreeMap<String, OutcomeResult> {
        self.outcomes
            .iter()
            .map(|(id, outcome)| (id.to_string(), outcome.result()))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, CoreEngineError> {
        serde_json::to_string(self).map_err(|e| CoreEngineError::Persistence(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, CoreEngineError> {
        serde_json::from_str(raw).map_err(|e| CoreEngineError::Persistence(e.to_string()))
    }
}

/// Puerto de persistencia de corridas.
pub trait SnapshotStore {
    fn save(&mut self, run: &PersistedRun) -> Result<(), CoreEngineError>;
    fn load(&self, run_id: Uuid) -> Result<Option<PersistedRun>, CoreEngineError>;
}

/// Guarda cada corrida como JSON, igual que lo haría un store externo.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    inner: HashMap<Uuid, String>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, run_id: Uuid) -> Option<&str> {
        self.inner.get(&run_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn save(&mut self, run: &PersistedRun) -> Result<(), CoreEngineError> {
        self.inner.insert(run.run_id, run.to_json()?);
        Ok(())
    }

    fn load(&self, run_id: Uuid) -> Result<Option<PersistedRun>, CoreEngineError> {
        self.inner.get(&run_id).map(|raw| PersistedRun::from_json(raw)).transpose()
    }
}
