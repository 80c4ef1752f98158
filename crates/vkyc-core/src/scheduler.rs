//! Scheduler inyectable para las transiciones temporizadas (guion de
//! liveness, espera de frames).
//!
//! `TokioScheduler` duerme de verdad; `ManualScheduler` resuelve de inmediato
//! y registra cada espera, de modo que los tests avanzan el guion sin reloj
//! de pared.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, period: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// Scheduler determinista: el tiempo sólo "pasa" cuando alguien duerme.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    ticks: Mutex<Vec<Duration>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Esperas solicitadas, en orden.
    pub fn ticks(&self) -> Vec<Duration> {
        self.ticks.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Tiempo virtual acumulado.
    pub fn elapsed(&self) -> Duration {
        self.ticks().iter().sum()
    }
}

#[async_trait]
impl Scheduler for ManualScheduler {
    async fn sleep(&self, period: Duration) {
        if let Ok(mut ticks) = self.ticks.lock() {
            ticks.push(period);
        }
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_scheduler_accumulates_virtual_time() {
        let s = ManualScheduler::new();
        s.sleep(Duration::from_secs(1)).await;
        s.sleep(Duration::from_millis(500)).await;
        assert_eq!(s.elapsed(), Duration::from_millis(1500));
        assert_eq!(s.ticks().len(), 2);
    }

    #[test]
    fn manual_scheduler_never_blocks() {
        let s = ManualScheduler::new();
        tokio_test::block_on(s.sleep(Duration::from_secs(3600)));
        assert_eq!(s.elapsed(), Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_sleeps_on_the_runtime_clock() {
        let start = tokio::time::Instant::now();
        TokioScheduler.sleep(Duration::from_secs(3)).await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
