//! SimulatedDevice (cámaras y geolocalización en memoria)
//!
//! - Permisos, hardware presente y soporte de geolocalización se fijan en un
//!   `DeviceProfile`.
//! - Cada handle entrega `warmup_frames` lecturas `NotReady` antes del primer
//!   frame.
//! - Los bytes de cada frame son el digest SHA-256 de (cámara, handle, n° de
//!   lectura): deterministas y distintos entre sí.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use sha2::{Digest, Sha256};
use vkyc_core::{CameraFacing, CaptureDevice, CaptureHandle, DeviceError, GeoFix, ImageBuffer};

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub camera_permission: bool,
    pub location_permission: bool,
    pub front_camera: bool,
    pub back_camera: bool,
    pub location_supported: bool,
    /// Lecturas `NotReady` por handle antes del primer frame.
    pub warmup_frames: u32,
    pub fix: GeoFix,
    /// Demora del prompt de permisos (cero en tests).
    pub prompt_delay: Duration,
    pub frame_size: (u32, u32),
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self { camera_permission: true,
               location_permission: true,
               front_camera: true,
               back_camera: true,
               location_supported: true,
               warmup_frames: 0,
               fix: GeoFix { latitude: 19.0760,
                             longitude: 72.8777,
                             accuracy: 25.0 },
               prompt_delay: Duration::ZERO,
               frame_size: (640, 480) }
    }
}

impl DeviceProfile {
    pub fn deny_camera(mut self) -> Self {
        self.camera_permission = false;
        self
    }

    pub fn deny_location(mut self) -> Self {
        self.location_permission = false;
        self
    }

    pub fn without_cameras(mut self) -> Self {
        self.front_camera = false;
        self.back_camera = false;
        self
    }

    pub fn with_warmup(mut self, frames: u32) -> Self {
        self.warmup_frames = frames;
        self
    }

    pub fn with_prompt_delay(mut self, delay: Duration) -> Self {
        self.prompt_delay = delay;
        self
    }
}

#[derive(Debug)]
struct OpenHandle {
    facing: CameraFacing,
    reads: u32,
}

#[derive(Debug, Default)]
pub struct SimulatedDevice {
    profile: DeviceProfile,
    next_id: AtomicU64,
    open: Mutex<HashMap<u64, OpenHandle>>,
}

impl SimulatedDevice {
    pub fn new(profile: DeviceProfile) -> Self {
        Self { profile,
               next_id: AtomicU64::new(1),
               open: Mutex::new(HashMap::new()) }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Handles de cámara sin liberar.
    pub fn open_handles(&self) -> usize {
        self.handles().len()
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<u64, OpenHandle>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_camera(&self, facing: CameraFacing) -> bool {
        match facing {
            CameraFacing::Front => self.profile.front_camera,
            CameraFacing::Back => self.profile.back_camera,
        }
    }

    async fn prompt(&self) {
        if !self.profile.prompt_delay.is_zero() {
            tokio::time::sleep(self.profile.prompt_delay).await;
        }
    }
}

fn frame_bytes(facing: CameraFacing, id: u64, read: u32) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(format!("{facing:?}:{id}:{read}").as_bytes());
    hasher.finalize().to_vec()
}

#[async_trait]
impl CaptureDevice for SimulatedDevice {
    async fn acquire_camera(&self, facing: CameraFacing) -> Result<CaptureHandle, DeviceError> {
        self.prompt().await;
        if !self.profile.camera_permission {
            return Err(DeviceError::PermissionDenied);
        }
        if !self.has_camera(facing) {
            return Err(DeviceError::DeviceUnavailable);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handles().insert(id, OpenHandle { facing, reads: 0 });
        debug!("simulated camera {facing:?} opened as {id}");
        Ok(CaptureHandle::new(id, facing))
    }

    fn snapshot(&self, handle: &CaptureHandle) -> Result<ImageBuffer, DeviceError> {
        let mut open = self.handles();
        let state = open.get_mut(&handle.id()).ok_or(DeviceError::DeviceUnavailable)?;
        state.reads += 1;
        if state.reads <= self.profile.warmup_frames {
            return Err(DeviceError::NotReady);
        }
        let (width, height) = self.profile.frame_size;
        Ok(ImageBuffer::new(width, height, frame_bytes(state.facing, handle.id(), state.reads)))
    }

    fn release(&self, handle: CaptureHandle) {
        if self.handles().remove(&handle.id()).is_some() {
            debug!("simulated camera handle {} released", handle.id());
        }
    }

    async fn acquire_location(&self) -> Result<GeoFix, DeviceError> {
        self.prompt().await;
        if !self.profile.location_supported {
            return Err(DeviceError::Unsupported);
        }
        if !self.profile.location_permission {
            return Err(DeviceError::PermissionDenied);
        }
        Ok(self.profile.fix)
    }
}
