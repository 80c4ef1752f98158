//! VKYC Flow Rust Library
//!
//! Este crate actúa como la capa de aplicación sobre `vkyc-core`:
//! - Expone `config` para leer `EngineConfig` y la simulación desde entorno.
//! - Expone `errors` para los errores de aplicación.
//! - Expone `flows` con el catálogo de flujos (VKYC completo y steps sueltos).
//! - Expone `runner` con la corrida de demostración usada por `main-core`.
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub mod config;
pub mod errors;
pub mod flows;
pub mod runner;

pub use config::{AppConfig, SimulationConfig};
pub use errors::AppError;
pub use flows::{standalone_registry, vkyc_registry};
pub use runner::{run_demo, write_report, DemoOptions, DemoReport};
