//! Modelos neutrales: entradas capturadas y outcomes de verificación.

pub mod capture;
pub mod outcome;

pub use capture::{CameraFacing, CaptureInput, GeoFix, ImageBuffer, LivenessFrame, LivenessInstruction, ManualAddress};
pub use outcome::{FailureReason, Outcome, OutcomeResult};
