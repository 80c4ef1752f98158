//! Engine module for WorkflowEngine implementation
//!
//! Provides the orchestrator, its builder, and the snapshot/persistence types
//! the presentation layer and external stores consume.

pub mod builder;
pub mod core;
pub mod snapshot;

pub use builder::WorkflowEngineBuilder;
pub use core::WorkflowEngine;
pub use snapshot::{Cursor, InMemorySnapshotStore, LedgerEntry, PersistedRun, RunStatus, SnapshotStore, StepView,
                   WorkflowSnapshot};

pub use crate::event::{EscalationReason, EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
