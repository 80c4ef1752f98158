//! vkyc-core: motor secuencial de verificación de identidad.
//!
//! Neutral respecto de la presentación y de los backends: los dispositivos
//! entran por `CaptureDevice`, las decisiones por `VerificationStrategy` y el
//! tiempo por `Scheduler`.
pub mod config;
pub mod constants;
pub mod device;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod model;
pub mod repo;
pub mod scheduler;
pub mod step;
pub mod strategy;

pub use config::{EngineConfig, RetryPolicy, Thresholds};
pub use device::{CameraLease, CaptureDevice, CaptureHandle, DeviceError, UnavailableDevice};
pub use engine::{Cursor, InMemorySnapshotStore, PersistedRun, RunStatus, SnapshotStore, StepView, WorkflowEngine,
                 WorkflowEngineBuilder, WorkflowSnapshot};
pub use errors::CoreEngineError;
pub use event::{EscalationReason, EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
pub use model::{CameraFacing, CaptureInput, FailureReason, GeoFix, ImageBuffer, LivenessFrame, LivenessInstruction,
                ManualAddress, Outcome, OutcomeResult};
pub use repo::{ResultLedger, StepRegistry};
pub use scheduler::{ManualScheduler, Scheduler, TokioScheduler};
pub use step::{StepDefinition, StepKind, SubState};
pub use strategy::{CaptureRequirement, Challenge, StrategyError, VerificationStrategy};
