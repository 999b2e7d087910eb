pub mod controller;
pub mod observer;
pub mod state;

pub use controller::{SessionController, SessionSnapshot};
pub use observer::SessionObserver;
pub use state::{ConfigError, SessionConfig, SessionRun, TickOutcome, WalkState};
