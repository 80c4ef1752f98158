//! Corrida de demostración de punta a punta.
//!
//! Arma un motor sobre `SimulatedDevice` + scorers simulados, ejecuta cada
//! step reintentando fallos hasta la política de reintentos (o
//! `DEFAULT_DEMO_ATTEMPTS` si no hay límite) y usa la dirección manual cuando
//! el dispositivo niega la ubicación. Si un step agota sus intentos la corrida
//! se escala a revisión humana.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use serde_json::json;
use uuid::Uuid;
use vkyc_adapters::{DeviceProfile, RecordingDevice, SimulatedDevice};
use vkyc_core::{CoreEngineError, ManualAddress, RunStatus, StepKind, TokioScheduler, WorkflowEngine,
                WorkflowSnapshot};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::flows::{standalone_registry, vkyc_registry};

/// Intentos por step cuando la configuración no fija un máximo.
pub const DEFAULT_DEMO_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemoOptions {
    pub seed: Option<u64>,
    pub deny_camera: bool,
    pub deny_location: bool,
    /// Corre un único step como página independiente.
    pub step: Option<StepKind>,
    /// Archivo donde volcar el reporte final en JSON.
    pub report: Option<PathBuf>,
}

impl DemoOptions {
    /// Interpreta `[--seed N] [--deny-camera] [--deny-location] [--step KIND] [--report PATH]`.
    pub fn parse(args: &[String]) -> Result<Self, AppError> {
        let mut opts = DemoOptions::default();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--seed" => {
                    i += 1;
                    let raw = args.get(i).ok_or_else(|| AppError::Config("--seed requiere un valor".into()))?;
                    opts.seed = Some(raw.parse()
                                        .map_err(|_| AppError::Config(format!("--seed inválido: {raw}")))?);
                }
                "--step" => {
                    i += 1;
                    let raw = args.get(i).ok_or_else(|| AppError::Config("--step requiere un valor".into()))?;
                    // el catálogo no ofrece steps `custom`
                    let kind = StepKind::from_slug(raw).filter(|k| *k != StepKind::Custom)
                                                       .ok_or_else(|| {
                                                           AppError::Config(format!("step desconocido: {raw}"))
                                                       })?;
                    opts.step = Some(kind);
                }
                "--report" => {
                    i += 1;
                    let raw = args.get(i).ok_or_else(|| AppError::Config("--report requiere una ruta".into()))?;
                    opts.report = Some(PathBuf::from(raw));
                }
                "--deny-camera" => opts.deny_camera = true,
                "--deny-location" => opts.deny_location = true,
                other => return Err(AppError::Config(format!("argumento desconocido: {other}"))),
            }
            i += 1;
        }
        Ok(opts)
    }

    fn profile(&self) -> DeviceProfile {
        let mut profile = DeviceProfile::default();
        if self.deny_camera {
            profile = profile.deny_camera();
        }
        if self.deny_location {
            profile = profile.deny_location();
        }
        profile
    }
}

#[derive(Debug, Clone)]
pub struct DemoReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    /// Snapshot tras cada comando, en orden.
    pub snapshots: Vec<WorkflowSnapshot>,
    pub event_variants: Vec<&'static str>,
    pub run_fingerprint: Option<String>,
    /// Toda cámara adquirida fue liberada.
    pub devices_released: bool,
}

/// Dirección usada como respaldo cuando la ubicación está bloqueada.
pub fn fallback_address() -> ManualAddress {
    ManualAddress::new("221B Baker Street", "London", "United Kingdom")
}

pub async fn run_demo(opts: &DemoOptions, cfg: &AppConfig) -> Result<DemoReport, AppError> {
    let mut cfg = cfg.clone();
    if let Some(seed) = opts.seed {
        cfg.simulation.seed = seed;
    }
    let registry = match opts.step {
        Some(kind) => standalone_registry(kind, &cfg)?,
        None => vkyc_registry(&cfg)?,
    };
    let device = Arc::new(RecordingDevice::new(SimulatedDevice::new(opts.profile())));
    let mut engine = WorkflowEngine::builder().registry(registry)
                                              .config(cfg.engine.clone())
                                              .device(device.clone())
                                              .scheduler(Arc::new(TokioScheduler))
                                              .build()?;
    let max_attempts = cfg.engine.retry.max_attempts.unwrap_or(DEFAULT_DEMO_ATTEMPTS);

    let run_id = engine.start()?;
    info!("demo run {run_id} started (seed {})", cfg.simulation.seed);
    let mut snapshots = vec![engine.snapshot()];

    while engine.status() == RunStatus::InProgress {
        let mut outcome = engine.capture().await?;
        snapshots.push(engine.snapshot());
        if !outcome.is_success() && manual_fallback_offered(&engine.snapshot()) {
            info!("location blocked, submitting manual address");
            outcome = engine.submit_manual_address(fallback_address()).await?;
            snapshots.push(engine.snapshot());
        }
        if outcome.is_success() {
            engine.advance()?;
            snapshots.push(engine.snapshot());
            continue;
        }
        // el motor pudo haber escalado solo al agotar los intentos
        if engine.status() != RunStatus::InProgress {
            break;
        }
        let attempts = engine.snapshot().current.map_or(0, |view| view.attempts);
        if attempts >= max_attempts {
            warn!("step exhausted {attempts} attempts, escalating");
            engine.escalate(format!("demo gave up after {attempts} attempts"))?;
            snapshots.push(engine.snapshot());
            break;
        }
        match engine.retry_current_step() {
            Ok(()) => snapshots.push(engine.snapshot()),
            Err(CoreEngineError::RetryLimitReached) => {
                engine.escalate("retry limit reached")?;
                snapshots.push(engine.snapshot());
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(DemoReport { run_id,
                    status: engine.status(),
                    snapshots,
                    event_variants: engine.event_variants(),
                    run_fingerprint: engine.run_fingerprint(),
                    devices_released: device.acquire_release_balanced() })
}

/// Vuelca snapshot final, eventos y fingerprint como JSON en `path`.
pub fn write_report(report: &DemoReport, path: &Path) -> Result<(), AppError> {
    let doc = json!({
        "run_id": report.run_id,
        "status": report.status,
        "final_snapshot": report.snapshots.last(),
        "events": report.event_variants.join(""),
        "run_fingerprint": report.run_fingerprint,
    });
    let raw = serde_json::to_string_pretty(&doc).map_err(std::io::Error::from)?;
    std::fs::write(path, raw)?;
    info!("report written to {}", path.display());
    Ok(())
}

fn manual_fallback_offered(snapshot: &WorkflowSnapshot) -> bool {
    snapshot.current
            .as_ref()
            .and_then(|view| view.notice.as_ref())
            .is_some_and(|notice| notice.manual_fallback)
}
