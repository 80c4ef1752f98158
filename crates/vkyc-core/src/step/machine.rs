//! Máquina de sub-estados del step activo: intro → capturing → processing →
//! result.
//!
//! La máquina es dueña exclusiva del `StepRuntimeState`. Los errores de
//! dispositivo y de estrategia se convierten aquí en un `Outcome` de fallo;
//! hacia el orquestador sólo sale `CoreEngineError` por mal uso.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{LivenessScript, StepDefinition, SubState};
use crate::config::EngineConfig;
use crate::device::{CameraLease, CaptureDevice, DeviceError};
use crate::errors::CoreEngineError;
use crate::hashing::hash_value;
use crate::model::{CameraFacing, CaptureInput, FailureReason, GeoFix, ImageBuffer, LivenessFrame, LivenessInstruction,
                   ManualAddress, Outcome, OutcomeResult};
use crate::scheduler::Scheduler;
use crate::strategy::{CaptureRequirement, Challenge};

/// Colaboradores de un intento.
pub struct AttemptContext<'a> {
    pub definition: &'a StepDefinition,
    pub device: &'a Arc<dyn CaptureDevice>,
    pub scheduler: &'a dyn Scheduler,
    pub config: &'a EngineConfig,
    /// Número de intento (1-based) que se sella en el outcome.
    pub attempt: u32,
}

/// Aviso visible para el usuario tras un fallo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub reason: FailureReason,
    pub message: String,
    /// El step ofrece entrada manual como alternativa.
    pub manual_fallback: bool,
}

impl Notice {
    pub fn for_failure(reason: FailureReason, requirement: CaptureRequirement) -> Self {
        let message = match reason {
            FailureReason::PermissionDenied => "Access to the device was denied",
            FailureReason::DeviceUnavailable => "No usable capture device was found",
            FailureReason::VerificationFailed => "Verification did not pass",
            FailureReason::VerificationTimeout => "Verification took too long to respond",
        };
        Self { reason,
               message: message.to_string(),
               manual_fallback: reason.is_permission_class() && requirement.allows_manual_entry() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Document,
    Selfie,
    LivenessFrame,
    GeoFix,
    ManualAddress,
}

/// Referencia a un artifact capturado (la UI resuelve el contenido aparte).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub digest: String,
}

/// Estado transitorio del step activo. Se descarta en reintento, avance,
/// escalamiento o abandono.
#[derive(Debug, Clone, Default)]
pub struct StepRuntimeState {
    document: Option<ImageBuffer>,
    selfie: Option<ImageBuffer>,
    frames: Vec<LivenessFrame>,
    location: Option<GeoFix>,
    manual_address: Option<ManualAddress>,
    instruction: Option<LivenessInstruction>,
    challenge: Challenge,
    notice: Option<Notice>,
}

impl StepRuntimeState {
    fn fresh(definition: &StepDefinition) -> Self {
        Self { challenge: definition.strategy().issue_challenge(),
               ..Self::default() }
    }

    fn clear_captures(&mut self) {
        self.document = None;
        self.selfie = None;
        self.frames.clear();
        self.location = None;
        self.manual_address = None;
        self.instruction = None;
    }

    pub fn document(&self) -> Option<&ImageBuffer> {
        self.document.as_ref()
    }

    pub fn selfie(&self) -> Option<&ImageBuffer> {
        self.selfie.as_ref()
    }

    pub fn frames(&self) -> &[LivenessFrame] {
        &self.frames
    }

    pub fn location(&self) -> Option<GeoFix> {
        self.location
    }

    pub fn manual_address(&self) -> Option<&ManualAddress> {
        self.manual_address.as_ref()
    }

    pub fn instruction(&self) -> Option<LivenessInstruction> {
        self.instruction
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn has_captures(&self) -> bool {
        self.document.is_some()
        || self.selfie.is_some()
        || !self.frames.is_empty()
        || self.location.is_some()
        || self.manual_address.is_some()
    }

    /// Referencias a los artifacts capturados, en orden de captura.
    pub fn artifacts(&self) -> Vec<ArtifactRef> {
        let mut refs = Vec::new();
        if let Some(doc) = &self.document {
            refs.push(ArtifactRef { kind: ArtifactKind::Document,
                                    digest: doc.digest() });
        }
        if let Some(selfie) = &self.selfie {
            refs.push(ArtifactRef { kind: ArtifactKind::Selfie,
                                    digest: selfie.digest() });
        }
        refs.extend(self.frames.iter().map(|f| ArtifactRef { kind: ArtifactKind::LivenessFrame,
                                                             digest: f.image.digest() }));
        if let Some(fix) = &self.location {
            let v = json!({"lat": fix.latitude, "lon": fix.longitude, "accuracy": fix.accuracy});
            refs.push(ArtifactRef { kind: ArtifactKind::GeoFix,
                                    digest: hash_value(&v) });
        }
        if let Some(addr) = &self.manual_address {
            let v = json!({
                "street": addr.street,
                "city": addr.city,
                "state": addr.state,
                "postal_code": addr.postal_code,
                "country": addr.country,
            });
            refs.push(ArtifactRef { kind: ArtifactKind::ManualAddress,
                                    digest: hash_value(&v) });
        }
        refs
    }
}

#[derive(Debug)]
pub struct StepMachine {
    index: usize,
    step_id: String,
    requirement: CaptureRequirement,
    sub_state: SubState,
    runtime: StepRuntimeState,
}

impl StepMachine {
    /// Máquina nueva en `Intro` con un desafío recién emitido.
    pub fn new(index: usize, definition: &StepDefinition) -> Self {
        Self { index,
               step_id: definition.id().to_string(),
               requirement: definition.requirement(),
               sub_state: SubState::Intro,
               runtime: StepRuntimeState::fresh(definition) }
    }

    /// Reconstruye la vista de un step a partir de su último outcome: sin
    /// outcome queda en `Intro`, con outcome se muestra su resultado sin
    /// volver a capturar.
    pub fn resume(index: usize, definition: &StepDefinition, previous: Option<&Outcome>) -> Self {
        let mut machine = Self::new(index, definition);
        if let Some(outcome) = previous {
            machine.sub_state = SubState::Result(outcome.result());
            machine.runtime.notice = outcome.reason()
                                            .map(|reason| Notice::for_failure(reason, machine.requirement));
        }
        machine
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn sub_state(&self) -> SubState {
        self.sub_state
    }

    pub fn runtime(&self) -> &StepRuntimeState {
        &self.runtime
    }

    /// Reintento: vuelve a `Intro` con estado limpio y desafío nuevo.
    pub fn reset(&mut self, definition: &StepDefinition) {
        self.enter(SubState::Intro);
        self.runtime = StepRuntimeState::fresh(definition);
    }

    fn interrupt(&mut self) {
        warn!("step {}: attempt interrupted, back to intro", self.step_id);
        self.sub_state = SubState::Intro;
        self.runtime.clear_captures();
        self.runtime.notice = None;
    }

    fn enter(&mut self, next: SubState) {
        debug!("step {} [{}]: {:?} -> {:?}", self.index, self.step_id, self.sub_state, next);
        self.sub_state = next;
    }

    /// Ejecuta un intento completo desde `Intro`. Sólo falla con `StepBusy`
    /// si el step no está en `Intro`; cualquier otro problema termina en
    /// `Result(Failure)`.
    pub async fn run_capture(&mut self,
                             ctx: &AttemptContext<'_>,
                             observer: &mut dyn FnMut(&StepMachine))
                             -> Result<Outcome, CoreEngineError> {
        if self.sub_state != SubState::Intro {
            return Err(CoreEngineError::StepBusy);
        }
        let mut guard = InterruptGuard::arm(self);
        let outcome = guard.machine.capture_and_verify(ctx, observer).await;
        guard.disarm();
        Ok(outcome)
    }

    /// Verifica una dirección ingresada a mano. Aceptado desde `Intro` o desde
    /// `Result(Failure)`; la dirección debe venir validada por el llamador.
    pub async fn run_manual(&mut self,
                            ctx: &AttemptContext<'_>,
                            address: ManualAddress,
                            observer: &mut dyn FnMut(&StepMachine))
                            -> Result<Outcome, CoreEngineError> {
        if !self.requirement.allows_manual_entry() {
            return Err(CoreEngineError::ManualEntryUnsupported);
        }
        match self.sub_state {
            SubState::Intro | SubState::Result(OutcomeResult::Failure) => {}
            _ => return Err(CoreEngineError::StepBusy),
        }
        self.runtime.clear_captures();
        self.runtime.notice = None;
        self.runtime.manual_address = Some(address.clone());
        let mut guard = InterruptGuard::arm(self);
        let outcome = guard.machine.verify(CaptureInput::ManualAddress(address), ctx, observer).await;
        guard.disarm();
        Ok(outcome)
    }

    async fn capture_and_verify(&mut self, ctx: &AttemptContext<'_>, observer: &mut dyn FnMut(&StepMachine)) -> Outcome {
        self.enter(SubState::Capturing);
        observer(self);
        match self.capture(ctx, observer).await {
            Ok(input) => self.verify(input, ctx, observer).await,
            Err(err) => {
                warn!("step {}: capture failed: {err}", self.step_id);
                self.conclude(Outcome::failure(err.failure_reason()), ctx, observer)
            }
        }
    }

    /// Adquiere y suelta dispositivos según el requerimiento del step. Todos
    /// los leases se sueltan antes de volver, así nunca hay una cámara tomada
    /// durante `Processing`.
    async fn capture(&mut self,
                     ctx: &AttemptContext<'_>,
                     observer: &mut dyn FnMut(&StepMachine))
                     -> Result<CaptureInput, DeviceError> {
        let period = ctx.config.liveness_tick;
        let attempts = ctx.config.snapshot_attempts;
        match self.requirement {
            CaptureRequirement::None => Ok(CaptureInput::None),
            CaptureRequirement::Selfie => {
                let selfie = still(ctx, CameraFacing::Front).await?;
                self.runtime.selfie = Some(selfie.clone());
                Ok(CaptureInput::Selfie(selfie))
            }
            CaptureRequirement::Document => {
                let document = still(ctx, CameraFacing::Back).await?;
                self.runtime.document = Some(document.clone());
                Ok(CaptureInput::Document(document))
            }
            CaptureRequirement::DocumentAndSelfie => {
                // una cámara a la vez: el lease trasero se suelta dentro de `still`
                let document = still(ctx, CameraFacing::Back).await?;
                self.runtime.document = Some(document.clone());
                observer(self);
                let selfie = still(ctx, CameraFacing::Front).await?;
                self.runtime.selfie = Some(selfie.clone());
                Ok(CaptureInput::DocumentAndSelfie { document, selfie })
            }
            CaptureRequirement::LivenessSequence => {
                let script = LivenessScript::from_config(ctx.config);
                let lease = CameraLease::acquire(ctx.device, CameraFacing::Front).await?;
                for step in script.transitions() {
                    self.runtime.instruction = Some(step.instruction);
                    observer(self);
                    ctx.scheduler.sleep(script.tick()).await;
                    let image = lease.snapshot_when_ready(ctx.scheduler, period, attempts).await?;
                    self.runtime.frames.push(LivenessFrame { instruction: step.instruction,
                                                             image });
                }
                lease.release();
                self.runtime.instruction = None;
                Ok(CaptureInput::LivenessFrames(self.runtime.frames.clone()))
            }
            CaptureRequirement::LocationOrManual => {
                let fix = ctx.device.acquire_location().await?;
                self.runtime.location = Some(fix);
                Ok(CaptureInput::Location(fix))
            }
        }
    }

    async fn verify(&mut self,
                    input: CaptureInput,
                    ctx: &AttemptContext<'_>,
                    observer: &mut dyn FnMut(&StepMachine))
                    -> Outcome {
        self.enter(SubState::Processing);
        observer(self);
        let strategy = ctx.definition.strategy();
        let bound = ctx.config.verification_timeout;
        let outcome = match tokio::time::timeout(bound, strategy.verify(&input, &self.runtime.challenge)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                warn!("step {}: strategy error: {err}", self.step_id);
                Outcome::failure(FailureReason::VerificationFailed)
            }
            Err(_) => {
                warn!("step {}: verification timed out after {:?}", self.step_id, bound);
                Outcome::failure(FailureReason::VerificationTimeout)
            }
        };
        self.conclude(outcome, ctx, observer)
    }

    fn conclude(&mut self, outcome: Outcome, ctx: &AttemptContext<'_>, observer: &mut dyn FnMut(&StepMachine)) -> Outcome {
        let outcome = outcome.sealed(ctx.attempt);
        self.runtime.instruction = None;
        self.runtime.notice = outcome.reason().map(|reason| Notice::for_failure(reason, self.requirement));
        self.enter(SubState::Result(outcome.result()));
        observer(self);
        outcome
    }
}

/// Un frame fijo con la cámara pedida; el lease se suelta al salir.
async fn still(ctx: &AttemptContext<'_>, facing: CameraFacing) -> Result<ImageBuffer, DeviceError> {
    let lease = CameraLease::acquire(ctx.device, facing).await?;
    lease.snapshot_when_ready(ctx.scheduler, ctx.config.liveness_tick, ctx.config.snapshot_attempts)
         .await
}

/// Si el future del intento se suelta a mitad de camino, la máquina vuelve a
/// `Intro` sin capturas.
struct InterruptGuard<'a> {
    machine: &'a mut StepMachine,
    armed: bool,
}

impl<'a> InterruptGuard<'a> {
    fn arm(machine: &'a mut StepMachine) -> Self {
        Self { machine, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.machine.interrupt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::UnavailableDevice;
    use crate::scheduler::ManualScheduler;
    use crate::step::StepKind;
    use crate::strategy::{StrategyError, VerificationStrategy};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct AcceptAll(CaptureRequirement);

    #[async_trait]
    impl VerificationStrategy for AcceptAll {
        fn requirement(&self) -> CaptureRequirement {
            self.0
        }
        fn issue_challenge(&self) -> Challenge {
            Challenge::Code("ABC123".into())
        }
        async fn verify(&self, input: &CaptureInput, _c: &Challenge) -> Result<Outcome, StrategyError> {
            match input {
                CaptureInput::None | CaptureInput::ManualAddress(_) => Ok(Outcome::success()),
                _ => Err(StrategyError::InvalidInput("unexpected capture".into())),
            }
        }
    }

    fn definition(requirement: CaptureRequirement) -> StepDefinition {
        StepDefinition::new("probe", StepKind::Custom, Arc::new(AcceptAll(requirement)))
    }

    #[tokio::test]
    async fn capture_without_device_requirement_succeeds() {
        let def = definition(CaptureRequirement::None);
        let device: Arc<dyn CaptureDevice> = Arc::new(UnavailableDevice);
        let scheduler = ManualScheduler::new();
        let config = EngineConfig::default();
        let ctx = AttemptContext { definition: &def,
                                   device: &device,
                                   scheduler: &scheduler,
                                   config: &config,
                                   attempt: 1 };
        let mut machine = StepMachine::new(0, &def);
        assert_eq!(machine.runtime().challenge().code(), Some("ABC123"));

        let mut seen = Vec::new();
        let outcome = machine.run_capture(&ctx, &mut |m| seen.push(m.sub_state())).await.expect("attempt");
        assert!(outcome.is_success());
        assert_eq!(outcome.attempt(), 1);
        assert_eq!(seen,
                   vec![SubState::Capturing, SubState::Processing, SubState::Result(OutcomeResult::Success)]);
    }

    #[tokio::test]
    async fn missing_camera_ends_in_failure_with_notice() {
        let def = definition(CaptureRequirement::Selfie);
        let device: Arc<dyn CaptureDevice> = Arc::new(UnavailableDevice);
        let scheduler = ManualScheduler::new();
        let config = EngineConfig::default();
        let ctx = AttemptContext { definition: &def,
                                   device: &device,
                                   scheduler: &scheduler,
                                   config: &config,
                                   attempt: 1 };
        let mut machine = StepMachine::new(0, &def);
        let outcome = machine.run_capture(&ctx, &mut |_| {}).await.expect("attempt");
        assert_eq!(outcome.reason(), Some(FailureReason::DeviceUnavailable));
        assert_eq!(machine.sub_state(), SubState::Result(OutcomeResult::Failure));
        let notice = machine.runtime().notice().expect("notice");
        assert!(!notice.manual_fallback);

        // un segundo intento sin reintento explícito se rechaza
        let again = machine.run_capture(&ctx, &mut |_| {}).await;
        assert_eq!(again.unwrap_err(), CoreEngineError::StepBusy);
    }

    #[tokio::test]
    async fn manual_entry_is_rejected_for_camera_steps() {
        let def = definition(CaptureRequirement::Document);
        let device: Arc<dyn CaptureDevice> = Arc::new(UnavailableDevice);
        let scheduler = ManualScheduler::new();
        let config = EngineConfig::default();
        let ctx = AttemptContext { definition: &def,
                                   device: &device,
                                   scheduler: &scheduler,
                                   config: &config,
                                   attempt: 1 };
        let mut machine = StepMachine::new(0, &def);
        let res = machine.run_manual(&ctx, ManualAddress::new("a", "b", "c"), &mut |_| {}).await;
        assert_eq!(res.unwrap_err(), CoreEngineError::ManualEntryUnsupported);
        assert_eq!(machine.sub_state(), SubState::Intro);
    }

    #[test]
    fn resume_shows_previous_result_without_captures() {
        let def = definition(CaptureRequirement::LocationOrManual);
        let failed = Outcome::failure(FailureReason::PermissionDenied).sealed(1);
        let machine = StepMachine::resume(3, &def, Some(&failed));
        assert_eq!(machine.sub_state(), SubState::Result(OutcomeResult::Failure));
        assert!(machine.runtime().notice().expect("notice").manual_fallback);
        assert!(!machine.runtime().has_captures());

        let fresh = StepMachine::resume(3, &def, None);
        assert_eq!(fresh.sub_state(), SubState::Intro);
    }

    #[test]
    fn reset_issues_a_fresh_runtime() {
        let def = definition(CaptureRequirement::LocationOrManual);
        let mut machine = StepMachine::resume(0, &def, Some(&Outcome::failure(FailureReason::VerificationFailed).sealed(1)));
        machine.reset(&def);
        assert_eq!(machine.sub_state(), SubState::Intro);
        assert!(machine.runtime().notice().is_none());
        assert_eq!(machine.runtime().challenge().code(), Some("ABC123"));
    }
}
