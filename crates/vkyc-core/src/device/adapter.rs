use async_trait::async_trait;
use thiserror::Error;

use crate::model::{CameraFacing, FailureReason, GeoFix, ImageBuffer};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    #[error("permission denied")] PermissionDenied,
    #[error("device unavailable")] DeviceUnavailable,
    #[error("device has not produced a frame yet")] NotReady,
    #[error("capability unsupported on this device")] Unsupported,
}

impl DeviceError {
    /// Motivo registrado en el outcome cuando la captura falla.
    pub fn failure_reason(self) -> FailureReason {
        match self {
            DeviceError::PermissionDenied => FailureReason::PermissionDenied,
            DeviceError::DeviceUnavailable | DeviceError::NotReady | DeviceError::Unsupported => {
                FailureReason::DeviceUnavailable
            }
        }
    }
}

/// Handle vivo sobre una cámara adquirida. No es `Clone`: se entrega por
/// valor a `release`, que lo consume.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct CaptureHandle {
    id: u64,
    facing: CameraFacing,
}

impl CaptureHandle {
    pub fn new(id: u64, facing: CameraFacing) -> Self {
        Self { id, facing }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }
}

/// Acceso a hardware de captura. Implementado por la plataforma (o por
/// simuladores en tests).
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Puede quedar suspendido en el prompt de permisos; el llamador cancela
    /// soltando el future.
    async fn acquire_camera(&self, facing: CameraFacing) -> Result<CaptureHandle, DeviceError>;

    /// Frame actual del handle. `NotReady` si todavía no hay frame.
    fn snapshot(&self, handle: &CaptureHandle) -> Result<ImageBuffer, DeviceError>;

    /// Libera la cámara. Síncrono e infalible para poder invocarse desde `Drop`.
    fn release(&self, handle: CaptureHandle);

    /// Disparo único; no deja handle abierto.
    async fn acquire_location(&self) -> Result<GeoFix, DeviceError>;
}

/// Dispositivo nulo: no hay cámara ni geolocalización. Útil para flujos que
/// sólo aceptan entrada manual.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDevice;

#[async_trait]
impl CaptureDevice for UnavailableDevice {
    async fn acquire_camera(&self, _facing: CameraFacing) -> Result<CaptureHandle, DeviceError> {
        Err(DeviceError::DeviceUnavailable)
    }

    fn snapshot(&self, _handle: &CaptureHandle) -> Result<ImageBuffer, DeviceError> {
        Err(DeviceError::DeviceUnavailable)
    }

    fn release(&self, _handle: CaptureHandle) {}

    async fn acquire_location(&self) -> Result<GeoFix, DeviceError> {
        Err(DeviceError::Unsupported)
    }
}
