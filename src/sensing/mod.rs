pub mod controller;
pub mod detector;
pub mod simulate;
pub mod source;

pub use controller::{StepCallback, StepCounter};
pub use detector::{StepDetector, STEP_DEBOUNCE_MS, STEP_THRESHOLD};
pub use simulate::SimulatedWalk;
pub use source::{MotionFeed, MotionSample, MotionSource, NoMotionSensor};
