//! Core WorkflowEngine implementation

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::json;
use tokio::sync::watch;
use uuid::Uuid;

use super::snapshot::{compose, Cursor, PersistedRun, RunStatus, RunView, SnapshotStore, WorkflowSnapshot};
use crate::config::EngineConfig;
use crate::constants::{ENGINE_VERSION, SNAPSHOT_SCHEMA_VERSION};
use crate::device::CaptureDevice;
use crate::errors::CoreEngineError;
use crate::event::{EscalationReason, EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
use crate::hashing::hash_value;
use crate::model::{ManualAddress, Outcome, OutcomeResult};
use crate::repo::{ResultLedger, StepRegistry};
use crate::scheduler::Scheduler;
use crate::step::{AttemptContext, StepDefinition, StepMachine, SubState};

/// Estado de una corrida. Existe una sola a la vez; `machine` es `None` en
/// los estados terminales.
#[derive(Debug)]
struct RunState {
    run_id: Uuid,
    cursor: Cursor,
    ledger: ResultLedger,
    attempts: Vec<u32>,
    machine: Option<StepMachine>,
}

impl RunState {
    fn view(&self) -> RunView<'_> {
        RunView { run_id: self.run_id,
                  cursor: &self.cursor,
                  ledger: &self.ledger,
                  attempts: &self.attempts,
                  machine: self.machine.as_ref() }
    }
}

/// Orquestador del workflow de verificación.
///
/// Expone comandos (`start`, `capture`, `advance`, `retry_current_step`,
/// `escalate`, `go_to_previous_step`, `abandon`) y consultas puras
/// (`snapshot`, `progress_percent`, ...). Cada comando que cambia estado
/// publica un `WorkflowSnapshot` a los suscriptores.
pub struct WorkflowEngine<E: EventStore = InMemoryEventStore> {
    registry: StepRegistry,
    config: EngineConfig,
    device: Arc<dyn CaptureDevice>,
    scheduler: Arc<dyn Scheduler>,
    event_store: E,
    run: Option<RunState>,
    last_run_id: Option<Uuid>,
    notifier: watch::Sender<WorkflowSnapshot>,
}

impl<E: EventStore> WorkflowEngine<E> {
    pub(crate) fn from_parts(registry: StepRegistry,
                             config: EngineConfig,
                             device: Arc<dyn CaptureDevice>,
                             scheduler: Arc<dyn Scheduler>,
                             event_store: E)
                             -> Self {
        let (notifier, _) = watch::channel(compose(&registry, None));
        Self { registry,
               config,
               device,
               scheduler,
               event_store,
               run: None,
               last_run_id: None,
               notifier }
    }

    // ---------------------------------------------------------------------
    // Comandos
    // ---------------------------------------------------------------------

    /// Inicia una corrida nueva en el primer step. Reiniciar descarta la
    /// corrida anterior.
    pub fn start(&mut self) -> Result<Uuid, CoreEngineError> {
        if let Some(previous) = self.run.take() {
            info!("discarding run {} before restart", previous.run_id);
        }
        let first = self.registry.get(0).ok_or(CoreEngineError::EmptyRegistry)?;
        let run_id = Uuid::new_v4();
        let machine = StepMachine::new(0, first);
        self.event_store.append_kind(run_id,
                                     FlowEventKind::RunStarted { definition_hash: self.registry
                                                                                     .definition_hash()
                                                                                     .to_string(),
                                                                 step_count: self.registry.len() });
        self.run = Some(RunState { run_id,
                                   cursor: Cursor::Step { index: 0 },
                                   ledger: ResultLedger::new(),
                                   attempts: vec![0; self.registry.len()],
                                   machine: Some(machine) });
        self.last_run_id = Some(run_id);
        info!("run {run_id} started ({} steps)", self.registry.len());
        self.publish();
        Ok(run_id)
    }

    /// Ejecuta un intento completo del step actual (captura + verificación) y
    /// registra el outcome. Los fallos de dispositivo o de verificación se
    /// devuelven como `Outcome` de fallo, no como error.
    pub async fn capture(&mut self) -> Result<Outcome, CoreEngineError> {
        let index = self.current_index()?;
        self.ensure_not_succeeded(index)?;
        if self.machine()?.sub_state() != SubState::Intro {
            return Err(CoreEngineError::StepBusy);
        }
        // un intento cancelado deja el step en Intro pero cuenta igual
        if self.config.retry.exhausted(self.attempts_at(index)) {
            return Err(CoreEngineError::RetryLimitReached);
        }
        self.attempt(index, None).await
    }

    /// Entrada manual de dirección para steps de ubicación. Una dirección
    /// incompleta se rechaza sin tocar el estado.
    pub async fn submit_manual_address(&mut self, address: ManualAddress) -> Result<Outcome, CoreEngineError> {
        let index = self.current_index()?;
        let definition = self.definition(index)?;
        if !definition.requirement().allows_manual_entry() {
            return Err(CoreEngineError::ManualEntryUnsupported);
        }
        let missing = address.missing_fields();
        if !missing.is_empty() {
            return Err(CoreEngineError::InvalidInput(format!("missing {}", missing.join(", "))));
        }
        self.ensure_not_succeeded(index)?;
        match self.machine()?.sub_state() {
            SubState::Intro => {}
            SubState::Result(OutcomeResult::Failure) => {
                // corregir tras un fallo cuenta como un intento más
                if self.config.retry.exhausted(self.attempts_at(index)) {
                    return Err(CoreEngineError::RetryLimitReached);
                }
            }
            _ => return Err(CoreEngineError::StepBusy),
        }
        self.attempt(index, Some(address)).await
    }

    /// Avanza al siguiente step, o completa la corrida si era el último.
    pub fn advance(&mut self) -> Result<RunStatus, CoreEngineError> {
        let index = self.current_index()?;
        let step_id = self.definition(index)?.id().to_string();
        let run = self.run.as_mut().ok_or(CoreEngineError::NotStarted)?;
        if !run.ledger.is_success(&step_id) {
            return Err(CoreEngineError::StepNotSuccessful);
        }
        let next = index + 1;
        match self.registry.get(next) {
            Some(definition) => {
                run.machine = Some(StepMachine::resume(next, definition, run.ledger.get(definition.id())));
                run.cursor = Cursor::Step { index: next };
                self.event_store.append_kind(run.run_id,
                                             FlowEventKind::StepAdvanced { from_index: index,
                                                                           to_index: Some(next) });
                debug!("run {}: advanced {index} -> {next}", run.run_id);
            }
            None => {
                run.machine = None;
                run.cursor = Cursor::Complete;
                let fingerprint = run_fingerprint(&self.registry, &run.ledger);
                self.event_store.append_kind(run.run_id,
                                             FlowEventKind::StepAdvanced { from_index: index,
                                                                           to_index: None });
                self.event_store.append_kind(run.run_id,
                                             FlowEventKind::RunCompleted { run_fingerprint: fingerprint.clone() });
                info!("run {} complete (fingerprint {fingerprint})", run.run_id);
            }
        }
        self.publish();
        Ok(self.status())
    }

    /// Descarta el estado del step actual y vuelve a `Intro`. Otros outcomes
    /// del ledger no se tocan; el outcome de fallo del step permanece hasta
    /// que un intento nuevo lo reemplace.
    pub fn retry_current_step(&mut self) -> Result<(), CoreEngineError> {
        let index = self.current_index()?;
        self.ensure_not_succeeded(index)?;
        if self.machine()?.sub_state().is_in_flight() {
            return Err(CoreEngineError::StepBusy);
        }
        let attempts = self.attempts_at(index);
        if self.config.retry.exhausted(attempts) {
            warn!("step {index}: retry refused after {attempts} attempts");
            return Err(CoreEngineError::RetryLimitReached);
        }
        let definition = self.registry.get(index).ok_or(CoreEngineError::NotStarted)?;
        let run = self.run.as_mut().ok_or(CoreEngineError::NotStarted)?;
        if let Some(machine) = run.machine.as_mut() {
            machine.reset(definition);
        }
        self.event_store.append_kind(run.run_id,
                                     FlowEventKind::RetryRequested { step_index: index,
                                                                     step_id: definition.id().to_string() });
        self.publish();
        Ok(())
    }

    /// Salida terminal a revisión humana, disponible desde cualquier estado
    /// no terminal.
    pub fn escalate(&mut self, note: impl Into<String>) -> Result<(), CoreEngineError> {
        self.escalate_with(EscalationReason::requested(note))
    }

    /// Muestra el step anterior (ya exitoso) en `Result(Success)` sin volver a
    /// capturar.
    pub fn go_to_previous_step(&mut self) -> Result<(), CoreEngineError> {
        let index = self.current_index()?;
        if self.machine()?.sub_state().is_in_flight() {
            return Err(CoreEngineError::StepBusy);
        }
        let previous = index.checked_sub(1).ok_or(CoreEngineError::NoPreviousStep)?;
        let definition = self.registry.get(previous).ok_or(CoreEngineError::NoPreviousStep)?;
        let run = self.run.as_mut().ok_or(CoreEngineError::NotStarted)?;
        if !run.ledger.is_success(definition.id()) {
            return Err(CoreEngineError::StepNotSuccessful);
        }
        run.machine = Some(StepMachine::resume(previous, definition, run.ledger.get(definition.id())));
        run.cursor = Cursor::Step { index: previous };
        self.event_store.append_kind(run.run_id,
                                     FlowEventKind::StepRevisited { from_index: index,
                                                                    to_index: previous });
        debug!("run {}: revisiting step {previous}", run.run_id);
        self.publish();
        Ok(())
    }

    /// Abandona la corrida (navegar fuera del flujo). Suelta la máquina y con
    /// ella cualquier dispositivo retenido.
    pub fn abandon(&mut self) -> Result<(), CoreEngineError> {
        let run = self.run.take().ok_or(CoreEngineError::NotStarted)?;
        self.event_store.append_kind(run.run_id,
                                     FlowEventKind::RunAbandoned { step_index: run.cursor.step_index() });
        info!("run {} abandoned", run.run_id);
        drop(run);
        self.publish();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Persistencia
    // ---------------------------------------------------------------------

    pub fn export_run(&self) -> Result<PersistedRun, CoreEngineError> {
        let run = self.run.as_ref().ok_or(CoreEngineError::NotStarted)?;
        Ok(PersistedRun::new(self.registry.definition_hash().to_string(),
                             run.run_id,
                             run.cursor.clone(),
                             run.attempts.clone(),
                             run.ledger.clone()))
    }

    /// Reconstruye una corrida persistida. Rechaza snapshots de otro registro
    /// o con un cursor incoherente con su ledger.
    pub fn restore_run(&mut self, persisted: PersistedRun) -> Result<(), CoreEngineError> {
        self.validate(&persisted)?;
        let machine = match &persisted.cursor {
            Cursor::Step { index } => {
                let definition = self.definition(*index)?;
                Some(StepMachine::resume(*index, definition, persisted.outcomes.get(definition.id())))
            }
            _ => None,
        };
        let completed_count = persisted.outcomes.completed_count(&self.registry);
        let run_id = persisted.run_id;
        self.run = Some(RunState { run_id,
                                   cursor: persisted.cursor,
                                   ledger: persisted.outcomes,
                                   attempts: persisted.attempts,
                                   machine });
        self.last_run_id = Some(run_id);
        self.event_store
            .append_kind(run_id, FlowEventKind::RunRestored { completed_count });
        info!("run {run_id} restored ({completed_count} steps complete)");
        self.publish();
        Ok(())
    }

    /// Guarda la corrida actual en el store y devuelve su id.
    pub fn persist<S: SnapshotStore>(&self, store: &mut S) -> Result<Uuid, CoreEngineError> {
        let persisted = self.export_run()?;
        store.save(&persisted)?;
        debug!("run {} persisted", persisted.run_id);
        Ok(persisted.run_id)
    }

    pub fn resume_from<S: SnapshotStore>(&mut self, store: &S, run_id: Uuid) -> Result<(), CoreEngineError> {
        let persisted = store.load(run_id)?
                             .ok_or_else(|| CoreEngineError::Persistence(format!("run {run_id} not found")))?;
        self.restore_run(persisted)
    }

    // ---------------------------------------------------------------------
    // Consultas
    // ---------------------------------------------------------------------

    /// Vista de sólo lectura del estado actual.
    pub fn snapshot(&self) -> WorkflowSnapshot {
        compose(&self.registry, self.run.as_ref().map(RunState::view))
    }

    /// Receptor que ve cada snapshot publicado, incluidos los intermedios de
    /// un intento (instrucciones de liveness, `Processing`).
    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.notifier.subscribe()
    }

    pub fn status(&self) -> RunStatus {
        match self.run.as_ref().map(|r| &r.cursor) {
            None => RunStatus::NotStarted,
            Some(Cursor::Step { .. }) => RunStatus::InProgress,
            Some(Cursor::Complete) => RunStatus::Complete,
            Some(Cursor::Escalated { reason, .. }) => RunStatus::Escalated { reason: reason.clone() },
        }
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run.as_ref().map(|r| r.run_id)
    }

    pub fn current_step_index(&self) -> Option<usize> {
        self.run.as_ref().and_then(|r| r.cursor.step_index())
    }

    pub fn current_sub_state(&self) -> Option<SubState> {
        self.run.as_ref().and_then(|r| r.machine.as_ref()).map(StepMachine::sub_state)
    }

    pub fn completed_count(&self) -> usize {
        self.run
            .as_ref()
            .map(|r| r.ledger.completed_count(&self.registry))
            .unwrap_or(0)
    }

    pub fn progress_percent(&self) -> f64 {
        super::snapshot::progress_percent(self.completed_count(), self.registry.len())
    }

    pub fn ledger(&self) -> Option<&ResultLedger> {
        self.run.as_ref().map(|r| &r.ledger)
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    /// Eventos de la corrida actual, o de la última si fue abandonada.
    pub fn events(&self) -> Vec<FlowEvent> {
        self.last_run_id
            .map(|id| self.event_store.list(id))
            .unwrap_or_default()
    }

    /// Variante compacta de eventos para la corrida actual.
    pub fn event_variants(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.kind.code()).collect()
    }

    /// Fingerprint de la corrida si está completa.
    pub fn run_fingerprint(&self) -> Option<String> {
        self.events().iter().rev().find_map(|e| match &e.kind {
                                      FlowEventKind::RunCompleted { run_fingerprint } => Some(run_fingerprint.clone()),
                                      _ => None,
                                  })
    }

    // ---------------------------------------------------------------------
    // Internos
    // ---------------------------------------------------------------------

    async fn attempt(&mut self, index: usize, manual: Option<ManualAddress>) -> Result<Outcome, CoreEngineError> {
        let Self { registry,
                   config,
                   device,
                   scheduler,
                   event_store,
                   run,
                   notifier,
                   .. } = self;
        let (registry, config, device, notifier) = (&*registry, &*config, &*device, &*notifier);
        let run = run.as_mut().ok_or(CoreEngineError::NotStarted)?;
        let definition = registry.get(index).ok_or(CoreEngineError::NotStarted)?;
        let step_id = definition.id().to_string();
        let run_id = run.run_id;

        let slot = run.attempts
                      .get_mut(index)
                      .ok_or_else(|| CoreEngineError::Internal(format!("no attempt counter for step {index}")))?;
        *slot += 1;
        let attempt = *slot;
        event_store.append_kind(run_id,
                                FlowEventKind::CaptureStarted { step_index: index,
                                                                step_id: step_id.clone(),
                                                                attempt,
                                                                manual: manual.is_some() });
        debug!("run {run_id}: step {step_id} attempt {attempt}");

        let ctx = AttemptContext { definition,
                                   device,
                                   scheduler: &**scheduler,
                                   config,
                                   attempt };
        let machine = run.machine.as_mut().ok_or(CoreEngineError::RunTerminated)?;
        let (cursor, ledger, attempts) = (&run.cursor, &run.ledger, &run.attempts);
        let mut observer = |m: &StepMachine| {
            if m.sub_state() == SubState::Processing {
                event_store.append_kind(run_id,
                                        FlowEventKind::VerificationStarted { step_index: index,
                                                                             step_id: step_id.clone() });
            }
            notifier.send_replace(compose(registry,
                                          Some(RunView { run_id,
                                                         cursor,
                                                         ledger,
                                                         attempts,
                                                         machine: Some(m) })));
        };
        let outcome = match manual {
            Some(address) => machine.run_manual(&ctx, address, &mut observer).await?,
            None => machine.run_capture(&ctx, &mut observer).await?,
        };

        self.record(index, outcome.clone())?;
        Ok(outcome)
    }

    /// Registra el outcome del intento y aplica la política de reintentos.
    fn record(&mut self, index: usize, outcome: Outcome) -> Result<(), CoreEngineError> {
        let step_id = self.definition(index)?.id().to_string();
        let attempts = self.attempts_at(index);
        let run = self.run.as_mut().ok_or(CoreEngineError::NotStarted)?;
        let kind = match outcome.reason() {
            None => FlowEventKind::StepSucceeded { step_index: index,
                                                   step_id: step_id.clone(),
                                                   attempt: outcome.attempt(),
                                                   confidence: outcome.confidence() },
            Some(reason) => {
                warn!("run {}: step {step_id} failed ({reason:?}) on attempt {}", run.run_id, outcome.attempt());
                FlowEventKind::StepFailed { step_index: index,
                                            step_id: step_id.clone(),
                                            attempt: outcome.attempt(),
                                            reason }
            }
        };
        let failed = !outcome.is_success();
        run.ledger.record(step_id.clone(), outcome);
        self.event_store.append_kind(run.run_id, kind);

        if failed && self.config.retry.auto_escalate && self.config.retry.exhausted(attempts) {
            return self.escalate_with(EscalationReason::RetriesExhausted { step_id, attempts });
        }
        self.publish();
        Ok(())
    }

    fn escalate_with(&mut self, reason: EscalationReason) -> Result<(), CoreEngineError> {
        let run = self.run.as_mut().ok_or(CoreEngineError::NotStarted)?;
        let from = match run.cursor {
            Cursor::Step { index } => index,
            _ => return Err(CoreEngineError::RunTerminated),
        };
        if run.machine.as_ref().is_some_and(|m| m.sub_state().is_in_flight()) {
            return Err(CoreEngineError::StepBusy);
        }
        run.machine = None;
        run.cursor = Cursor::Escalated { from: Some(from),
                                         reason: reason.clone() };
        info!("run {} escalated at step {from}: {reason:?}", run.run_id);
        self.event_store.append_kind(run.run_id,
                                     FlowEventKind::RunEscalated { step_index: Some(from),
                                                                   reason });
        self.publish();
        Ok(())
    }

    fn validate(&self, persisted: &PersistedRun) -> Result<(), CoreEngineError> {
        if persisted.schema_version != SNAPSHOT_SCHEMA_VERSION
           || persisted.definition_hash != self.registry.definition_hash()
           || persisted.attempts.len() != self.registry.len()
        {
            return Err(CoreEngineError::SnapshotMismatch);
        }
        if persisted.outcomes.iter().any(|(id, _)| self.registry.position(id).is_none()) {
            return Err(CoreEngineError::SnapshotMismatch);
        }
        // el cursor sólo puede estar más allá de steps exitosos
        let succeeded_before = |end: usize| {
            self.registry
                .iter()
                .take(end)
                .all(|s| persisted.outcomes.is_success(s.id()))
        };
        let coherent = match &persisted.cursor {
            Cursor::Step { index } => *index < self.registry.len() && succeeded_before(*index),
            Cursor::Complete => succeeded_before(self.registry.len()),
            Cursor::Escalated { from, .. } => from.map_or(true, |i| i < self.registry.len()),
        };
        if coherent {
            Ok(())
        } else {
            Err(CoreEngineError::SnapshotMismatch)
        }
    }

    fn publish(&self) {
        self.notifier.send_replace(self.snapshot());
    }

    fn current_index(&self) -> Result<usize, CoreEngineError> {
        let run = self.run.as_ref().ok_or(CoreEngineError::NotStarted)?;
        run.cursor.step_index().ok_or(CoreEngineError::RunTerminated)
    }

    fn machine(&self) -> Result<&StepMachine, CoreEngineError> {
        self.run
            .as_ref()
            .and_then(|r| r.machine.as_ref())
            .ok_or(CoreEngineError::RunTerminated)
    }

    fn definition(&self, index: usize) -> Result<&StepDefinition, CoreEngineError> {
        self.registry
            .get(index)
            .ok_or_else(|| CoreEngineError::Internal(format!("step index {index} out of range")))
    }

    fn attempts_at(&self, index: usize) -> u32 {
        self.run
            .as_ref()
            .and_then(|r| r.attempts.get(index).copied())
            .unwrap_or(0)
    }

    fn ensure_not_succeeded(&self, index: usize) -> Result<(), CoreEngineError> {
        let id = self.definition(index)?.id();
        match self.ledger() {
            Some(ledger) if ledger.is_success(id) => Err(CoreEngineError::StepAlreadySucceeded),
            _ => Ok(()),
        }
    }
}

/// Fingerprint de una corrida completa: versión del motor, registro y
/// resultados en orden de registro.
fn run_fingerprint(registry: &StepRegistry, ledger: &ResultLedger) -> String {
    let steps: Vec<_> = registry.iter()
                                .map(|s| json!({"id": s.id(), "result": ledger.result_of(s.id())}))
                                .collect();
    hash_value(&json!({
        "engine_version": ENGINE_VERSION,
        "definition_hash": registry.definition_hash(),
        "steps": steps,
    }))
}
