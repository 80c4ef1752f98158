//! Entradas capturadas desde dispositivos (o ingresadas a mano) que una
//! estrategia de verificación consume.
//!
//! El motor no interpreta el contenido de las imágenes: sólo las transporta y
//! expone su digest para que la capa de presentación pueda referenciarlas.

use serde::{Deserialize, Serialize};

use crate::hashing::hash_bytes;

/// Cámara solicitada al adaptador de dispositivos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    Front,
    Back,
}

/// Frame capturado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ImageBuffer {
    pub fn new(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self { width, height, bytes }
    }

    /// Digest estable del contenido (blake3 hex).
    pub fn digest(&self) -> String {
        hash_bytes(&self.bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Posición de un único disparo de geolocalización.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Radio de precisión en metros.
    pub accuracy: f64,
}

/// Dirección ingresada a mano cuando no hay acceso a la geolocalización.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualAddress {
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
}

impl ManualAddress {
    pub fn new(street: impl Into<String>, city: impl Into<String>, country: impl Into<String>) -> Self {
        Self { street: street.into(),
               city: city.into(),
               country: country.into(),
               ..Self::default() }
    }

    /// Campos obligatorios vacíos (street, city, country).
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.street.trim().is_empty() {
            missing.push("street");
        }
        if self.city.trim().is_empty() {
            missing.push("city");
        }
        if self.country.trim().is_empty() {
            missing.push("country");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Instrucciones del guion de liveness, en el orden estándar
/// center → left → right → hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessInstruction {
    Center,
    TurnLeft,
    TurnRight,
    Hold,
}

impl LivenessInstruction {
    pub fn message(&self) -> &'static str {
        match self {
            LivenessInstruction::Center => "Look straight at the camera",
            LivenessInstruction::TurnLeft => "Slowly turn your head to the left",
            LivenessInstruction::TurnRight => "Slowly turn your head to the right",
            LivenessInstruction::Hold => "Hold still",
        }
    }

    pub fn standard_script() -> Vec<Self> {
        vec![LivenessInstruction::Center,
             LivenessInstruction::TurnLeft,
             LivenessInstruction::TurnRight,
             LivenessInstruction::Hold]
    }
}

/// Frame tomado mientras una instrucción del guion estaba activa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessFrame {
    pub instruction: LivenessInstruction,
    pub image: ImageBuffer,
}

/// Entrada entregada a `VerificationStrategy::verify`. Cada variante se
/// corresponde con un `CaptureRequirement`.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureInput {
    None,
    Selfie(ImageBuffer),
    Document(ImageBuffer),
    DocumentAndSelfie { document: ImageBuffer, selfie: ImageBuffer },
    LivenessFrames(Vec<LivenessFrame>),
    Location(GeoFix),
    ManualAddress(ManualAddress),
}
