use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// One accelerometer reading including gravity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Sensor clock in milliseconds; only differences matter.
    pub timestamp_ms: u64,
}

impl MotionSample {
    pub fn new(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp_ms,
        }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A device that can stream motion samples. Dropping the receiver unsubscribes.
pub trait MotionSource: Send + Sync {
    /// `None` when the device has no motion sensor.
    fn subscribe(&self) -> Option<UnboundedReceiver<MotionSample>>;
}

/// Stand-in for devices without an accelerometer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMotionSensor;

impl MotionSource for NoMotionSensor {
    fn subscribe(&self) -> Option<UnboundedReceiver<MotionSample>> {
        None
    }
}

/// Fan-out point a platform sensor adapter pushes readings into.
#[derive(Debug, Default)]
pub struct MotionFeed {
    subscribers: Mutex<Vec<UnboundedSender<MotionSample>>>,
}

impl MotionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, sample: MotionSample) {
        self.subscribers()
            .retain(|subscriber| subscriber.send(sample).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers();
        subscribers.retain(|subscriber| !subscriber.is_closed());
        subscribers.len()
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<UnboundedSender<MotionSample>>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl MotionSource for MotionFeed {
    fn subscribe(&self) -> Option<UnboundedReceiver<MotionSample>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers().push(tx);
        Some(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude() {
        let sample = MotionSample::new(3.0, 4.0, 12.0, 0);
        assert!((sample.magnitude() - 13.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_feed_drops_closed_subscribers() {
        let feed = MotionFeed::new();
        let mut kept = feed.subscribe().unwrap();
        let dropped = feed.subscribe().unwrap();
        assert_eq!(feed.subscriber_count(), 2);

        drop(dropped);
        feed.push(MotionSample::new(0.0, 0.0, 9.8, 1));

        assert_eq!(feed.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap().timestamp_ms, 1);
    }

    #[test]
    fn test_no_sensor_has_no_stream() {
        assert!(NoMotionSensor.subscribe().is_none());
    }
}
