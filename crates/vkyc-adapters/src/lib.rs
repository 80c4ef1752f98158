//! vkyc-adapters: implementaciones concretas para el motor de verificación.
//!
//! Este crate provee:
//! - Dispositivos: `SimulatedDevice` (permisos, hardware y warm-up
//!   configurables) y `RecordingDevice` (registra cada llamada para
//!   aserciones de balance acquire/release).
//! - Scorers: contratos de puntaje biométrico y OCR con implementaciones fijas
//!   (tests) y simuladas con `rand` (demo).
//! - Estrategias: liveness, face match, handwriting y location sobre esos
//!   scorers.
//!
//! Nota: el core sólo conoce `CaptureDevice` y `VerificationStrategy`; nada
//! de aquí es visible para el orquestador salvo a través de esos traits.

pub mod devices;
pub mod scorers;
pub mod strategies;

pub use devices::{DeviceCall, DeviceProfile, RecordingDevice, SimulatedDevice};
pub use scorers::{EchoText, FaceMatcher, FixedScore, FixedText, LivenessScorer, SimulatedScorer, Stalled,
                  TextExtractor, Unreachable};
pub use strategies::{FaceLivenessStrategy, FaceMatchStrategy, HandwritingStrategy, LocationStrategy};
