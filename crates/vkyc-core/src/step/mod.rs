//! Definiciones relacionadas a Steps.
//!
//! Un Step es un chequeo de verificación dentro del workflow. Este módulo
//! define:
//! - `StepDefinition`: metadatos inmutables + estrategia.
//! - `SubState`: ciclo de vida de un intento.
//! - `StepMachine`: la máquina de sub-estados del step activo.
//! - `LivenessScript`: el guion temporizado de liveness.

pub mod definition;
pub mod liveness;
pub mod machine;
mod status;

pub use definition::{StepDefinition, StepKind};
pub use liveness::{LivenessScript, TimedInstruction};
pub use machine::{ArtifactKind, ArtifactRef, AttemptContext, Notice, StepMachine, StepRuntimeState};
pub use status::SubState;
