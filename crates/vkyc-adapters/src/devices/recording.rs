//! RecordingDevice: envoltorio que registra cada llamada al dispositivo.
//!
//! Se usa en harnesses de test para afirmar que cada `acquire_camera` exitoso
//! tiene su `release` antes del siguiente `acquire_camera`.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use vkyc_core::{CameraFacing, CaptureDevice, CaptureHandle, DeviceError, GeoFix, ImageBuffer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    /// `handle` es `None` cuando la adquisición falló.
    AcquireCamera { facing: CameraFacing, handle: Option<u64> },
    Snapshot { handle: u64, ok: bool },
    Release { handle: u64 },
    Location { granted: bool },
}

#[derive(Debug)]
pub struct RecordingDevice<D> {
    inner: D,
    calls: Mutex<Vec<DeviceCall>>,
}

impl<D: CaptureDevice> RecordingDevice<D> {
    pub fn new(inner: D) -> Self {
        Self { inner,
               calls: Mutex::new(Vec::new()) }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.log().clone()
    }

    /// Adquisiciones de cámara concedidas.
    pub fn camera_acquisitions(&self) -> usize {
        self.log()
            .iter()
            .filter(|c| matches!(c, DeviceCall::AcquireCamera { handle: Some(_), .. }))
            .count()
    }

    /// Cada cámara concedida se libera antes de pedir la siguiente y no queda
    /// ninguna abierta al final.
    pub fn acquire_release_balanced(&self) -> bool {
        let mut open: HashSet<u64> = HashSet::new();
        for call in self.log().iter() {
            match call {
                DeviceCall::AcquireCamera { handle, .. } => {
                    if !open.is_empty() {
                        return false;
                    }
                    if let Some(id) = handle {
                        open.insert(*id);
                    }
                }
                DeviceCall::Release { handle } => {
                    if !open.remove(handle) {
                        return false;
                    }
                }
                DeviceCall::Snapshot { .. } | DeviceCall::Location { .. } => {}
            }
        }
        open.is_empty()
    }

    fn log(&self) -> MutexGuard<'_, Vec<DeviceCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<D: CaptureDevice> CaptureDevice for RecordingDevice<D> {
    async fn acquire_camera(&self, facing: CameraFacing) -> Result<CaptureHandle, DeviceError> {
        let res = self.inner.acquire_camera(facing).await;
        self.log().push(DeviceCall::AcquireCamera { facing,
                                                    handle: res.as_ref().ok().map(CaptureHandle::id) });
        res
    }

    fn snapshot(&self, handle: &CaptureHandle) -> Result<ImageBuffer, DeviceError> {
        let res = self.inner.snapshot(handle);
        self.log().push(DeviceCall::Snapshot { handle: handle.id(),
                                               ok: res.is_ok() });
        res
    }

    fn release(&self, handle: CaptureHandle) {
        self.log().push(DeviceCall::Release { handle: handle.id() });
        self.inner.release(handle);
    }

    async fn acquire_location(&self) -> Result<GeoFix, DeviceError> {
        let res = self.inner.acquire_location().await;
        self.log().push(DeviceCall::Location { granted: res.is_ok() });
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DeviceProfile, SimulatedDevice};

    #[tokio::test]
    async fn balanced_when_each_camera_is_released() {
        let device = RecordingDevice::new(SimulatedDevice::new(DeviceProfile::default()));
        let back = device.acquire_camera(CameraFacing::Back).await.expect("back");
        device.snapshot(&back).expect("frame");
        device.release(back);
        let front = device.acquire_camera(CameraFacing::Front).await.expect("front");
        device.release(front);
        assert!(device.acquire_release_balanced());
        assert_eq!(device.camera_acquisitions(), 2);
        assert_eq!(device.calls().len(), 5);
    }

    #[tokio::test]
    async fn overlapping_handles_are_unbalanced() {
        let device = RecordingDevice::new(SimulatedDevice::new(DeviceProfile::default()));
        let back = device.acquire_camera(CameraFacing::Back).await.expect("back");
        let front = device.acquire_camera(CameraFacing::Front).await.expect("front");
        device.release(back);
        device.release(front);
        assert!(!device.acquire_release_balanced());
    }

    #[tokio::test]
    async fn denied_acquisitions_are_recorded_without_handle() {
        let device = RecordingDevice::new(SimulatedDevice::new(DeviceProfile::default().deny_camera()));
        assert!(device.acquire_camera(CameraFacing::Front).await.is_err());
        assert_eq!(device.calls(),
                   vec![DeviceCall::AcquireCamera { facing: CameraFacing::Front,
                                                    handle: None }]);
        assert_eq!(device.camera_acquisitions(), 0);
        assert!(device.acquire_release_balanced());
    }
}
