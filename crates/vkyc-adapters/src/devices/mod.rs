//! Adaptadores de dispositivos de captura.

mod recording;
mod simulated;

pub use recording::{DeviceCall, RecordingDevice};
pub use simulated::{DeviceProfile, SimulatedDevice};
