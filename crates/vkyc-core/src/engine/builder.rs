//! Builder para `WorkflowEngine`.
//!
//! Notas de diseño
//! - Los steps se agregan en orden; `build` valida el registro (no vacío, ids
//!   únicos) y calcula su `definition_hash`.
//! - El dispositivo por defecto es `UnavailableDevice` y el scheduler por
//!   defecto es `TokioScheduler`; los tests inyectan dobles deterministas.
//!
//! ```ignore
//! let mut engine = WorkflowEngine::builder()
//!     .step(liveness)
//!     .step(face_match)
//!     .device(device)
//!     .build()?;
//! engine.start()?;
//! ```

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::device::{CaptureDevice, UnavailableDevice};
use crate::engine::WorkflowEngine;
use crate::errors::CoreEngineError;
use crate::event::{EventStore, InMemoryEventStore};
use crate::repo::StepRegistry;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::step::StepDefinition;

pub struct WorkflowEngineBuilder<E: EventStore = InMemoryEventStore> {
    event_store: E,
    steps: Vec<StepDefinition>,
    config: EngineConfig,
    device: Option<Arc<dyn CaptureDevice>>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl<E: EventStore> WorkflowEngineBuilder<E> {
    pub fn new(event_store: E) -> Self {
        Self { event_store,
               steps: Vec::new(),
               config: EngineConfig::default(),
               device: None,
               scheduler: None }
    }

    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = StepDefinition>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Reemplaza los steps por los de un registro ya validado.
    pub fn registry(mut self, registry: StepRegistry) -> Self {
        self.steps = registry.into_steps();
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn device(mut self, device: Arc<dyn CaptureDevice>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn build(self) -> Result<WorkflowEngine<E>, CoreEngineError> {
        let registry = StepRegistry::new(self.steps)?;
        let device = self.device.unwrap_or_else(|| Arc::new(UnavailableDevice));
        let scheduler = self.scheduler.unwrap_or_else(|| Arc::new(TokioScheduler));
        Ok(WorkflowEngine::from_parts(registry, self.config, device, scheduler, self.event_store))
    }
}

impl WorkflowEngine<InMemoryEventStore> {
    /// Builder con event store en memoria.
    #[inline]
    pub fn builder() -> WorkflowEngineBuilder<InMemoryEventStore> {
        WorkflowEngineBuilder::new(InMemoryEventStore::default())
    }
}

impl<E: EventStore> WorkflowEngine<E> {
    #[inline]
    pub fn builder_with_store(event_store: E) -> WorkflowEngineBuilder<E> {
        WorkflowEngineBuilder::new(event_store)
    }
}
