use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::strategy::{CaptureRequirement, VerificationStrategy};

/// Tipo general del step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    FaceLiveness,
    FaceMatch,
    Handwriting,
    Location,
    Custom,
}

impl StepKind {
    pub fn slug(&self) -> &'static str {
        match self {
            StepKind::FaceLiveness => "face_liveness",
            StepKind::FaceMatch => "face_match",
            StepKind::Handwriting => "handwriting",
            StepKind::Location => "location",
            StepKind::Custom => "custom",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "face_liveness" | "liveness" => Some(StepKind::FaceLiveness),
            "face_match" => Some(StepKind::FaceMatch),
            "handwriting" => Some(StepKind::Handwriting),
            "location" => Some(StepKind::Location),
            "custom" => Some(StepKind::Custom),
            _ => None,
        }
    }
}

/// Definición inmutable de un step. Se construye una vez desde configuración
/// estática y nunca se modifica.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    id: String,
    kind: StepKind,
    title: String,
    description: String,
    /// Sólo orientativo para la UI.
    estimated_duration: Duration,
    strategy: Arc<dyn VerificationStrategy>,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>, kind: StepKind, strategy: Arc<dyn VerificationStrategy>) -> Self {
        let id = id.into();
        Self { title: id.clone(),
               id,
               kind,
               description: String::new(),
               estimated_duration: Duration::ZERO,
               strategy }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_estimated_duration(mut self, estimated: Duration) -> Self {
        self.estimated_duration = estimated;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn estimated_duration(&self) -> Duration {
        self.estimated_duration
    }

    pub fn strategy(&self) -> &Arc<dyn VerificationStrategy> {
        &self.strategy
    }

    pub fn requirement(&self) -> CaptureRequirement {
        self.strategy.requirement()
    }
}
