//! Contrato del adaptador de dispositivos de captura (cámara y
//! geolocalización) y el lease RAII que garantiza su liberación.

mod adapter;
mod lease;

pub use adapter::{CaptureDevice, CaptureHandle, DeviceError, UnavailableDevice};
pub use lease::CameraLease;
