//! SimulatedScorer: decisiones aleatorias reproducibles.
//!
//! Con probabilidad `pass_rate` el puntaje cae en 90..100 (y el OCR lee el
//! código esperado); si no, en 40..75 (y el OCR devuelve un código
//! alterado). Con los umbrales por defecto (80 y 85) eso equivale a aprobar o
//! reprobar.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vkyc_core::{ImageBuffer, LivenessFrame, StrategyError};

use super::{FaceMatcher, LivenessScorer, TextExtractor};

#[derive(Debug)]
pub struct SimulatedScorer {
    rng: Mutex<StdRng>,
    pass_rate: f64,
    latency: Duration,
}

impl SimulatedScorer {
    pub fn new(seed: u64, pass_rate: f64, latency: Duration) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)),
               pass_rate: pass_rate.clamp(0.0, 1.0),
               latency }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn draw(&self) -> (bool, f64) {
        let mut rng = self.rng();
        let pass = rng.gen_bool(self.pass_rate);
        let score = if pass { rng.gen_range(90.0..100.0) } else { rng.gen_range(40.0..75.0) };
        (pass, score)
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl LivenessScorer for SimulatedScorer {
    async fn liveness(&self, frames: &[LivenessFrame]) -> Result<f64, StrategyError> {
        self.wait().await;
        let (_, score) = self.draw();
        debug!("simulated liveness over {} frames: {score:.1}", frames.len());
        Ok(score)
    }
}

#[async_trait]
impl FaceMatcher for SimulatedScorer {
    async fn similarity(&self, _document: &ImageBuffer, _selfie: &ImageBuffer) -> Result<f64, StrategyError> {
        self.wait().await;
        let (_, score) = self.draw();
        debug!("simulated face match: {score:.1}");
        Ok(score)
    }
}

#[async_trait]
impl TextExtractor for SimulatedScorer {
    async fn extract(&self, _image: &ImageBuffer, expected: &str) -> Result<String, StrategyError> {
        self.wait().await;
        let (pass, _) = self.draw();
        if pass {
            Ok(expected.to_string())
        } else {
            Ok(expected.chars().rev().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_seed_same_scores() {
        let a = SimulatedScorer::new(7, 0.5, Duration::ZERO);
        let b = SimulatedScorer::new(7, 0.5, Duration::ZERO);
        for _ in 0..5 {
            let x = a.liveness(&[]).await.expect("score");
            let y = b.liveness(&[]).await.expect("score");
            assert_eq!(x, y);
        }
    }

    #[tokio::test]
    async fn pass_rate_bounds_the_score_band() {
        let always = SimulatedScorer::new(1, 1.0, Duration::ZERO);
        let never = SimulatedScorer::new(1, 0.0, Duration::ZERO);
        let img = ImageBuffer::new(1, 1, vec![0]);
        for _ in 0..10 {
            assert!(always.similarity(&img, &img).await.expect("score") >= 90.0);
            assert!(never.similarity(&img, &img).await.expect("score") < 75.0);
        }
        assert_eq!(always.extract(&img, "AB12").await.expect("text"), "AB12");
        assert_eq!(never.extract(&img, "AB12").await.expect("text"), "21BA");
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_slept_on_the_tokio_clock() {
        let slow = SimulatedScorer::new(3, 1.0, Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        slow.liveness(&[]).await.expect("score");
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
