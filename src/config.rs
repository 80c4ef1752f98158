//! Configuración de la aplicación desde variables de entorno.
//! Carga `.env` una sola vez y traduce las variables `VKYC_*` a un
//! `EngineConfig` del core más los parámetros de la simulación.
//! Las variables ausentes conservan el valor por defecto; las presentes pero
//! inválidas son un `AppError::Config`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use vkyc_core::EngineConfig;

use crate::errors::AppError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const FACE_MATCH_THRESHOLD: &str = "VKYC_FACE_MATCH_THRESHOLD";
pub const LIVENESS_THRESHOLD: &str = "VKYC_LIVENESS_THRESHOLD";
pub const VERIFICATION_TIMEOUT_MS: &str = "VKYC_VERIFICATION_TIMEOUT_MS";
pub const LIVENESS_TICK_MS: &str = "VKYC_LIVENESS_TICK_MS";
pub const SNAPSHOT_ATTEMPTS: &str = "VKYC_SNAPSHOT_ATTEMPTS";
pub const MAX_ATTEMPTS: &str = "VKYC_MAX_ATTEMPTS";
pub const AUTO_ESCALATE: &str = "VKYC_AUTO_ESCALATE";
pub const SIMULATION_SEED: &str = "VKYC_SIMULATION_SEED";
pub const SIMULATION_PASS_RATE: &str = "VKYC_SIMULATION_PASS_RATE";
pub const SIMULATION_LATENCY_MS: &str = "VKYC_SIMULATION_LATENCY_MS";

/// Parámetros de los scorers simulados del binario de demo.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Probabilidad (0..=1) de que un intento simulado apruebe.
    pub pass_rate: f64,
    pub latency: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { seed: 7,
               pass_rate: 0.8,
               latency: Duration::from_millis(150) }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Lee la configuración del proceso (incluido `.env`).
    pub fn from_env() -> Result<Self, AppError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables inyectable.
    pub fn from_vars<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let mut cfg = AppConfig::default();
        let engine = &mut cfg.engine;
        if let Some(v) = parse_var::<f64, _>(&lookup, FACE_MATCH_THRESHOLD)? {
            engine.thresholds.face_match = threshold(FACE_MATCH_THRESHOLD, v)?;
        }
        if let Some(v) = parse_var::<f64, _>(&lookup, LIVENESS_THRESHOLD)? {
            engine.thresholds.liveness = threshold(LIVENESS_THRESHOLD, v)?;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, VERIFICATION_TIMEOUT_MS)? {
            engine.verification_timeout = millis(VERIFICATION_TIMEOUT_MS, ms)?;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, LIVENESS_TICK_MS)? {
            engine.liveness_tick = millis(LIVENESS_TICK_MS, ms)?;
        }
        if let Some(n) = parse_var::<u32, _>(&lookup, SNAPSHOT_ATTEMPTS)? {
            engine.snapshot_attempts = positive(SNAPSHOT_ATTEMPTS, n)?;
        }
        if let Some(n) = parse_var::<u32, _>(&lookup, MAX_ATTEMPTS)? {
            engine.retry.max_attempts = Some(positive(MAX_ATTEMPTS, n)?);
        }
        if let Some(raw) = non_empty(&lookup, AUTO_ESCALATE) {
            engine.retry.auto_escalate = parse_flag(AUTO_ESCALATE, &raw)?;
        }

        let sim = &mut cfg.simulation;
        if let Some(seed) = parse_var::<u64, _>(&lookup, SIMULATION_SEED)? {
            sim.seed = seed;
        }
        if let Some(rate) = parse_var::<f64, _>(&lookup, SIMULATION_PASS_RATE)? {
            if !(0.0..=1.0).contains(&rate) {
                return Err(AppError::Config(format!("{SIMULATION_PASS_RATE} fuera de rango 0..=1: {rate}")));
            }
            sim.pass_rate = rate;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, SIMULATION_LATENCY_MS)? {
            sim.latency = Duration::from_millis(ms);
        }
        Ok(cfg)
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
    where F: Fn(&str) -> Option<String>
{
    lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, AppError>
    where T: FromStr,
          F: Fn(&str) -> Option<String>
{
    match non_empty(lookup, name) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>()
                        .map(Some)
                        .map_err(|_| AppError::Config(format!("{name} inválido: {raw}"))),
    }
}

fn threshold(name: &str, value: f64) -> Result<f64, AppError> {
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::Config(format!("{name} fuera de rango 0..=100: {value}")))
    }
}

fn millis(name: &str, ms: u64) -> Result<Duration, AppError> {
    if ms == 0 {
        return Err(AppError::Config(format!("{name} debe ser mayor que 0")));
    }
    Ok(Duration::from_millis(ms))
}

fn positive(name: &str, n: u32) -> Result<u32, AppError> {
    if n == 0 {
        return Err(AppError::Config(format!("{name} debe ser mayor que 0")));
    }
    Ok(n)
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("{name} inválido: {raw}"))),
    }
}
