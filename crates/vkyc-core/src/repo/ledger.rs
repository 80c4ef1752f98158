//! `ResultLedger`: último `Outcome` por step.
//!
//! Insertar sobre un step existente reemplaza el outcome anterior (reintento).
//! El almacenamiento conserva orden de inserción; el orquestador siempre lo
//! recorre en orden de registro.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::StepRegistry;
use crate::model::{Outcome, OutcomeResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultLedger {
    entries: IndexMap<String, Outcome>,
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra (o reemplaza) el outcome de un step y devuelve el anterior.
    pub fn record(&mut self, step_id: impl Into<String>, outcome: Outcome) -> Option<Outcome> {
        self.entries.insert(step_id.into(), outcome)
    }

    pub fn get(&self, step_id: &str) -> Option<&Outcome> {
        self.entries.get(step_id)
    }

    pub fn result_of(&self, step_id: &str) -> Option<OutcomeResult> {
        self.get(step_id).map(Outcome::result)
    }

    pub fn is_success(&self, step_id: &str) -> bool {
        self.result_of(step_id) == Some(OutcomeResult::Success)
    }

    /// Steps del registro con outcome `success`.
    pub fn completed_count(&self, registry: &StepRegistry) -> usize {
        registry.iter().filter(|s| self.is_success(s.id())).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FailureReason;

    #[test]
    fn record_overwrites_and_returns_previous() {
        let mut ledger = ResultLedger::new();
        assert!(ledger.record("geo", Outcome::failure(FailureReason::PermissionDenied)).is_none());
        let prev = ledger.record("geo", Outcome::success()).expect("previous");
        assert_eq!(prev.reason(), Some(FailureReason::PermissionDenied));
        assert!(ledger.is_success("geo"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn unknown_step_has_no_result() {
        let ledger = ResultLedger::new();
        assert_eq!(ledger.result_of("missing"), None);
        assert!(!ledger.is_success("missing"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn iteration_keeps_insertion_order() {
        let mut ledger = ResultLedger::new();
        ledger.record("b", Outcome::success());
        ledger.record("a", Outcome::failure(FailureReason::VerificationFailed));
        ledger.record("b", Outcome::failure(FailureReason::VerificationTimeout));
        let keys: Vec<_> = ledger.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
