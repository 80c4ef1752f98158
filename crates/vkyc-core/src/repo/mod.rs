//! Registro de steps (definición inmutable del flujo) y ledger de resultados.

mod ledger;
mod registry;

pub use ledger::ResultLedger;
pub use registry::StepRegistry;
