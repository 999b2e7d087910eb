use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::{
    detector::StepDetector,
    source::{MotionSample, MotionSource},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Called with the cumulative step count each time a step registers.
pub type StepCallback = Box<dyn Fn(u32) + Send + Sync + 'static>;

pub struct StepCounter {
    source: Arc<dyn MotionSource>,
    detector_template: StepDetector,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl StepCounter {
    pub fn new(source: Arc<dyn MotionSource>) -> Self {
        Self::with_detector(source, StepDetector::default())
    }

    pub fn with_detector(source: Arc<dyn MotionSource>, detector: StepDetector) -> Self {
        Self {
            source,
            detector_template: detector,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Starts counting from zero. Without a motion sensor this succeeds but no
    /// step ever fires.
    pub fn activate(&mut self, on_step: StepCallback) {
        if let Some(stale) = self.handle.take() {
            log_warn!("step counter re-activated while running; dropping previous loop");
            if let Some(token) = self.cancel_token.take() {
                token.cancel();
            }
            stale.abort();
        }

        let Some(samples) = self.source.subscribe() else {
            log_info!("no motion sensor available; step counting disabled");
            return;
        };

        let mut detector = self.detector_template.clone();
        detector.reset();

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(step_loop(
            samples,
            detector,
            on_step,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
    }

    pub async fn deactivate(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("step counter loop failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

async fn step_loop(
    mut samples: UnboundedReceiver<MotionSample>,
    mut detector: StepDetector,
    on_step: StepCallback,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_debug!("step loop cancelled after {} steps", detector.steps());
                break;
            }
            sample = samples.recv() => match sample {
                Some(sample) => {
                    if let Some(count) = detector.observe(&sample) {
                        on_step(count);
                    }
                }
                None => {
                    log_info!("motion stream closed; step counting stopped");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::sensing::source::{MotionFeed, NoMotionSensor};

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, StepCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Box::new(move |count| sink.lock().unwrap().push(count)))
    }

    fn peak(at_ms: u64) -> MotionSample {
        MotionSample::new(0.0, 6.0, 10.0, at_ms)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_counts_debounced_steps() {
        let feed = Arc::new(MotionFeed::new());
        let mut counter = StepCounter::new(feed.clone());
        let (seen, on_step) = recorder();

        counter.activate(on_step);
        feed.push(peak(0));
        feed.push(peak(200));
        feed.push(peak(700));
        settle().await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        counter.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_no_callbacks_after_deactivate() {
        let feed = Arc::new(MotionFeed::new());
        let mut counter = StepCounter::new(feed.clone());
        let (seen, on_step) = recorder();

        counter.activate(on_step);
        counter.deactivate().await.unwrap();
        assert!(!counter.is_active());

        feed.push(peak(0));
        settle().await;
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_reactivation_restarts_count() {
        let feed = Arc::new(MotionFeed::new());
        let mut counter = StepCounter::new(feed.clone());

        let (first, on_step) = recorder();
        counter.activate(on_step);
        feed.push(peak(0));
        settle().await;
        counter.deactivate().await.unwrap();

        let (second, on_step) = recorder();
        counter.activate(on_step);
        feed.push(peak(100));
        settle().await;

        assert_eq!(*first.lock().unwrap(), vec![1]);
        assert_eq!(*second.lock().unwrap(), vec![1]);
        counter.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_sensor_degrades_silently() {
        let mut counter = StepCounter::new(Arc::new(NoMotionSensor));
        let (seen, on_step) = recorder();
        counter.activate(on_step);
        assert!(!counter.is_active());
        counter.deactivate().await.unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }
}
