//! `CameraLease`: propiedad exclusiva de una cámara durante la captura.
//!
//! El lease libera el handle en `Drop`, de modo que cualquier salida del
//! sub-estado `capturing` (éxito, error, timeout o cancelación del future)
//! devuelve la cámara al adaptador.

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use super::{CaptureDevice, CaptureHandle, DeviceError};
use crate::model::{CameraFacing, ImageBuffer};
use crate::scheduler::Scheduler;

pub struct CameraLease {
    device: Arc<dyn CaptureDevice>,
    handle: Option<CaptureHandle>,
    facing: CameraFacing,
}

impl CameraLease {
    pub async fn acquire(device: &Arc<dyn CaptureDevice>, facing: CameraFacing) -> Result<Self, DeviceError> {
        let handle = device.acquire_camera(facing).await?;
        debug!("camera {:?} acquired (handle {})", facing, handle.id());
        Ok(Self { device: Arc::clone(device),
                  handle: Some(handle),
                  facing })
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn snapshot(&self) -> Result<ImageBuffer, DeviceError> {
        match &self.handle {
            Some(handle) => self.device.snapshot(handle),
            None => Err(DeviceError::NotReady),
        }
    }

    /// Reintenta `NotReady` una vez por `period`, hasta `attempts` lecturas.
    pub async fn snapshot_when_ready(&self,
                                     scheduler: &dyn Scheduler,
                                     period: Duration,
                                     attempts: u32)
                                     -> Result<ImageBuffer, DeviceError> {
        let mut remaining = attempts.max(1);
        loop {
            match self.snapshot() {
                Err(DeviceError::NotReady) if remaining > 1 => {
                    remaining -= 1;
                    debug!("camera {:?} not ready, waiting {:?}", self.facing, period);
                    scheduler.sleep(period).await;
                }
                other => return other,
            }
        }
    }

    /// Liberación explícita; equivalente a soltar el lease.
    pub fn release(mut self) {
        self.release_handle();
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("camera {:?} released (handle {})", self.facing, handle.id());
            self.device.release(handle);
        }
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        self.release_handle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoFix;
    use crate::scheduler::ManualScheduler;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingDevice {
        warmup: u32,
        reads: Mutex<u32>,
        released: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl CaptureDevice for CountingDevice {
        async fn acquire_camera(&self, facing: CameraFacing) -> Result<CaptureHandle, DeviceError> {
            Ok(CaptureHandle::new(7, facing))
        }
        fn snapshot(&self, _handle: &CaptureHandle) -> Result<ImageBuffer, DeviceError> {
            let mut reads = self.reads.lock().expect("reads");
            *reads += 1;
            if *reads <= self.warmup {
                Err(DeviceError::NotReady)
            } else {
                Ok(ImageBuffer::new(1, 1, vec![*reads as u8]))
            }
        }
        fn release(&self, handle: CaptureHandle) {
            self.released.lock().expect("released").push(handle.id());
        }
        async fn acquire_location(&self) -> Result<GeoFix, DeviceError> {
            Err(DeviceError::Unsupported)
        }
    }

    #[tokio::test]
    async fn drop_releases_the_handle_once() {
        let device = Arc::new(CountingDevice::default());
        let shared: Arc<dyn CaptureDevice> = device.clone();
        let lease = CameraLease::acquire(&shared, CameraFacing::Front).await.expect("lease");
        drop(lease);
        assert_eq!(*device.released.lock().unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn warmup_frames_are_waited_on_the_scheduler() {
        let device = Arc::new(CountingDevice { warmup: 2,
                                               ..CountingDevice::default() });
        let shared: Arc<dyn CaptureDevice> = device.clone();
        let scheduler = ManualScheduler::default();
        let lease = CameraLease::acquire(&shared, CameraFacing::Back).await.expect("lease");
        let frame = lease.snapshot_when_ready(&scheduler, Duration::from_millis(100), 3).await;
        assert_eq!(frame.expect("frame").bytes, vec![3]);
        assert_eq!(scheduler.ticks().len(), 2);
        lease.release();
        assert_eq!(device.released.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn warmup_gives_up_after_configured_attempts() {
        let device = Arc::new(CountingDevice { warmup: 10,
                                               ..CountingDevice::default() });
        let shared: Arc<dyn CaptureDevice> = device.clone();
        let scheduler = ManualScheduler::default();
        let lease = CameraLease::acquire(&shared, CameraFacing::Back).await.expect("lease");
        let frame = lease.snapshot_when_ready(&scheduler, Duration::from_millis(100), 3).await;
        assert_eq!(frame, Err(DeviceError::NotReady));
        assert_eq!(*device.reads.lock().unwrap(), 3);
    }
}
