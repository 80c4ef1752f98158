//! `StepRegistry`: lista ordenada e inmutable de `StepDefinition`.
//!
//! El orden del registro es el orden del workflow. La `definition_hash` se
//! calcula sobre `[{id, kind}]` en JSON canónico y sirve para validar snapshots
//! persistidos contra el registro vigente.

use std::collections::HashSet;

use serde_json::json;

use crate::errors::CoreEngineError;
use crate::hashing::{hash_str, to_canonical_json};
use crate::step::StepDefinition;

#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
    definition_hash: String,
}

impl StepRegistry {
    /// Valida ids únicos y registro no vacío.
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, CoreEngineError> {
        if steps.is_empty() {
            return Err(CoreEngineError::EmptyRegistry);
        }
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id()) {
                return Err(CoreEngineError::DuplicateStepId(step.id().to_string()));
            }
        }
        let shape: Vec<_> = steps.iter()
                                 .map(|s| json!({"id": s.id(), "kind": s.kind().slug()}))
                                 .collect();
        let definition_hash = hash_str(&to_canonical_json(&json!(shape)));
        Ok(Self { steps, definition_hash })
    }

    pub fn definition_hash(&self) -> &str {
        &self.definition_hash
    }

    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == step_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<StepDefinition> {
        self.steps
    }
}
