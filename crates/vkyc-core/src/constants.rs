//! Constantes del motor core.
//!
//! `ENGINE_VERSION` participa en el fingerprint de una corrida completada, por
//! lo que cambiarlo invalida la comparación con fingerprints anteriores.

/// Versión lógica del motor. Se incluye en el fingerprint de cada corrida.
pub const ENGINE_VERSION: &str = "V1.0";

/// Versión del esquema de `PersistedRun`. Incrementar ante cambios
/// incompatibles en el formato serializado.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;
