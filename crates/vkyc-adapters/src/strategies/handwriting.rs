//! Handwriting: el usuario escribe a mano un código emitido por intento y
//! fotografía el papel; el OCR debe leer el mismo código.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use vkyc_core::{CaptureInput, CaptureRequirement, Challenge, FailureReason, Outcome, StrategyError,
                VerificationStrategy};

use crate::scorers::TextExtractor;

/// Sin 0/O ni 1/I, que se confunden escritos a mano.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;

#[derive(Debug)]
pub struct HandwritingStrategy<T> {
    extractor: T,
    rng: Mutex<StdRng>,
}

impl<T: TextExtractor> HandwritingStrategy<T> {
    pub fn new(extractor: T) -> Self {
        Self::with_rng(extractor, StdRng::from_entropy())
    }

    /// Códigos reproducibles.
    pub fn seeded(extractor: T, seed: u64) -> Self {
        Self::with_rng(extractor, StdRng::seed_from_u64(seed))
    }

    fn with_rng(extractor: T, rng: StdRng) -> Self {
        Self { extractor,
               rng: Mutex::new(rng) }
    }

    fn next_code(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        (0..CODE_LEN).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
                     .collect()
    }
}

#[async_trait]
impl<T: TextExtractor + std::fmt::Debug> VerificationStrategy for HandwritingStrategy<T> {
    fn requirement(&self) -> CaptureRequirement {
        CaptureRequirement::Document
    }

    fn issue_challenge(&self) -> Challenge {
        Challenge::Code(self.next_code())
    }

    async fn verify(&self, input: &CaptureInput, challenge: &Challenge) -> Result<Outcome, StrategyError> {
        let CaptureInput::Document(image) = input else {
            return Err(StrategyError::InvalidInput("handwriting expects a document photo".into()));
        };
        let code = challenge.code()
                            .ok_or_else(|| StrategyError::InvalidInput("no code was issued".into()))?;
        let text = self.extractor.extract(image, code).await?;
        // el OCR no distingue mayúsculas y suele agregar espacios en los bordes
        let outcome = if text.trim().eq_ignore_ascii_case(code) {
            Outcome::success()
        } else {
            Outcome::failure(FailureReason::VerificationFailed)
        };
        Ok(outcome.with_extracted_data(json!({ "text": text })))
    }
}
