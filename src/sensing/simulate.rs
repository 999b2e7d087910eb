use std::{f64::consts::TAU, sync::Arc, time::Duration};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::source::{MotionFeed, MotionSample};

const GRAVITY: f64 = 9.81;
const SAMPLE_INTERVAL_MS: u64 = 20;

/// Synthetic accelerometer for running without a phone in the pocket.
/// Produces one vertical bounce per stride plus some sensor jitter.
pub struct SimulatedWalk {
    cadence_spm: f64,
    bounce: f64,
    jitter: f64,
    rng: StdRng,
}

impl SimulatedWalk {
    pub fn new(cadence_spm: f64) -> Self {
        Self {
            cadence_spm,
            bounce: 3.0,
            jitter: 0.4,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(cadence_spm: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(cadence_spm)
        }
    }

    pub fn sample_at(&mut self, timestamp_ms: u64) -> MotionSample {
        let stride_hz = self.cadence_spm / 60.0;
        let t = timestamp_ms as f64 / 1000.0;
        let vertical = GRAVITY + self.bounce * (TAU * stride_hz * t).sin();

        let mut noise = || self.rng.gen_range(-self.jitter..self.jitter);
        MotionSample::new(noise(), noise(), vertical + noise(), timestamp_ms)
    }

    /// Streams samples into `feed` until the token is cancelled.
    pub fn spawn(
        mut self,
        feed: Arc<MotionFeed>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(SAMPLE_INTERVAL_MS));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut timestamp_ms = 0;

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = ticker.tick() => {
                        feed.push(self.sample_at(timestamp_ms));
                        timestamp_ms += SAMPLE_INTERVAL_MS;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::detector::StepDetector;

    #[test]
    fn test_detector_counts_simulated_cadence() {
        let mut walk = SimulatedWalk::seeded(110.0, 7);
        let mut detector = StepDetector::default();

        for timestamp_ms in (0..60_000).step_by(SAMPLE_INTERVAL_MS as usize) {
            detector.observe(&walk.sample_at(timestamp_ms));
        }

        // One peak per stride; jitter may split or miss a few.
        let steps = detector.steps();
        assert!((100..=120).contains(&steps), "counted {steps} steps");
    }
}
