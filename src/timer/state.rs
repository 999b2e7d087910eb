use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_FAST_PHASE_SECONDS: u32 = 180;
pub const DEFAULT_SLOW_PHASE_SECONDS: u32 = 180;
pub const DEFAULT_TOTAL_DURATION_SECONDS: u32 = 30 * 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalkState {
    #[default]
    Idle,
    Fast,
    Slow,
    Finished,
}

impl WalkState {
    pub fn is_active(&self) -> bool {
        matches!(self, WalkState::Fast | WalkState::Slow)
    }

    pub fn can_start(&self) -> bool {
        matches!(self, WalkState::Idle | WalkState::Finished)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WalkState::Idle => "IDLE",
            WalkState::Fast => "FAST",
            WalkState::Slow => "SLOW",
            WalkState::Finished => "FINISHED",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

/// Immutable per-run timing configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub fast_phase_seconds: u32,
    pub slow_phase_seconds: u32,
    pub total_duration_seconds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fast_phase_seconds: DEFAULT_FAST_PHASE_SECONDS,
            slow_phase_seconds: DEFAULT_SLOW_PHASE_SECONDS,
            total_duration_seconds: DEFAULT_TOTAL_DURATION_SECONDS,
        }
    }
}

impl SessionConfig {
    pub fn new(
        fast_phase_seconds: u32,
        slow_phase_seconds: u32,
        total_duration_seconds: u32,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            fast_phase_seconds,
            slow_phase_seconds,
            total_duration_seconds,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_phase_seconds == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "fast_phase_seconds",
            });
        }
        if self.slow_phase_seconds == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "slow_phase_seconds",
            });
        }
        if self.total_duration_seconds == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "total_duration_seconds",
            });
        }
        Ok(())
    }

    pub fn phase_seconds(&self, state: WalkState) -> u32 {
        match state {
            WalkState::Slow => self.slow_phase_seconds,
            _ => self.fast_phase_seconds,
        }
    }

    /// Number of phases a full session is planned around (one fast/slow pair
    /// per started cycle).
    pub fn total_phases(&self) -> u32 {
        let cycle = u64::from(self.fast_phase_seconds) + u64::from(self.slow_phase_seconds);
        let cycles = u64::from(self.total_duration_seconds).div_ceil(cycle.max(1));
        u32::try_from(cycles * 2).unwrap_or(u32::MAX)
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_duration_seconds / 60
    }
}

/// Result of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown had already reached zero; the session must finish.
    Expired,
    /// One second was consumed in `phase`. `phase_ended` is set when the
    /// interval countdown ran out and a phase switch is due.
    Advanced { phase: WalkState, phase_ended: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRun {
    pub state: WalkState,
    pub config: SessionConfig,
    pub run_id: Option<String>,
    pub seconds_remaining_total: u32,
    pub seconds_remaining_interval: u32,
    pub current_phase_index: u32,
    pub step_count: u32,
    pub started_at: Option<DateTime<Utc>>,
}

impl Default for SessionRun {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl SessionRun {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            state: WalkState::Idle,
            config,
            run_id: None,
            seconds_remaining_total: 0,
            seconds_remaining_interval: 0,
            current_phase_index: 0,
            step_count: 0,
            started_at: None,
        }
    }

    pub fn begin(&mut self, run_id: String, started_at: DateTime<Utc>) {
        let config = self.config;
        *self = Self {
            state: WalkState::Fast,
            config,
            run_id: Some(run_id),
            seconds_remaining_total: config.total_duration_seconds,
            seconds_remaining_interval: config.fast_phase_seconds,
            current_phase_index: 1,
            step_count: 0,
            started_at: Some(started_at),
        };
    }

    pub fn advance(&mut self) -> TickOutcome {
        if self.seconds_remaining_total == 0 {
            return TickOutcome::Expired;
        }

        self.seconds_remaining_total -= 1;
        self.seconds_remaining_interval = self.seconds_remaining_interval.saturating_sub(1);

        TickOutcome::Advanced {
            phase: self.state,
            phase_ended: self.seconds_remaining_interval == 0,
        }
    }

    /// Flips between the fast and slow pace and restarts the interval countdown.
    pub fn switch_phase(&mut self) -> WalkState {
        self.state = match self.state {
            WalkState::Fast => WalkState::Slow,
            _ => WalkState::Fast,
        };
        self.seconds_remaining_interval = self.config.phase_seconds(self.state);
        self.current_phase_index += 1;
        self.state
    }

    pub fn record_steps(&mut self, cumulative: u32) {
        self.step_count = self.step_count.max(cumulative);
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.config
            .total_duration_seconds
            .saturating_sub(self.seconds_remaining_total)
    }

    pub fn elapsed_minutes(&self) -> u32 {
        self.elapsed_seconds() / 60
    }

    pub fn halt(&mut self) {
        self.state = WalkState::Idle;
    }

    pub fn complete(&mut self) {
        self.state = WalkState::Finished;
    }

    pub fn is_run(&self, run_id: &str) -> bool {
        self.run_id.as_deref() == Some(run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(config: SessionConfig) -> SessionRun {
        let mut run = SessionRun::new(config);
        run.begin("run-1".into(), Utc::now());
        run
    }

    #[test]
    fn test_begin_starts_fast_at_phase_one() {
        let run = started(SessionConfig::default());
        assert_eq!(run.state, WalkState::Fast);
        assert_eq!(run.seconds_remaining_total, 1800);
        assert_eq!(run.seconds_remaining_interval, 180);
        assert_eq!(run.current_phase_index, 1);
        assert_eq!(run.step_count, 0);
        assert!(run.started_at.is_some());
    }

    #[test]
    fn test_full_session_tick_count_and_phase_switches() {
        let mut run = started(SessionConfig::default());
        let mut ticks = 0;
        let mut switches = 0;
        let mut sequence = vec![run.state];

        loop {
            match run.advance() {
                TickOutcome::Expired => break,
                TickOutcome::Advanced { phase_ended, .. } => {
                    ticks += 1;
                    if phase_ended {
                        let previous = run.current_phase_index;
                        sequence.push(run.switch_phase());
                        assert_eq!(run.current_phase_index, previous + 1);
                        switches += 1;
                    }
                }
            }
        }

        assert_eq!(ticks, 1800);
        assert_eq!(switches, 10);
        assert_eq!(run.seconds_remaining_total, 0);
        for pair in sequence.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert_eq!(sequence[0], WalkState::Fast);
        assert_eq!(sequence[1], WalkState::Slow);
    }

    #[test]
    fn test_truncated_final_phase() {
        let config = SessionConfig::new(60, 90, 100).unwrap();
        let mut run = started(config);
        let mut ticks = 0;
        while let TickOutcome::Advanced { phase_ended, .. } = run.advance() {
            ticks += 1;
            if phase_ended {
                run.switch_phase();
            }
        }
        assert_eq!(ticks, 100);
        assert_eq!(run.state, WalkState::Slow);
        // 40 of the 90 slow seconds were consumed before the countdown ran out.
        assert_eq!(run.seconds_remaining_interval, 50);
    }

    #[test]
    fn test_switch_uses_configured_lengths() {
        let config = SessionConfig::new(3, 5, 100).unwrap();
        let mut run = started(config);
        assert_eq!(run.switch_phase(), WalkState::Slow);
        assert_eq!(run.seconds_remaining_interval, 5);
        assert_eq!(run.switch_phase(), WalkState::Fast);
        assert_eq!(run.seconds_remaining_interval, 3);
        assert_eq!(run.current_phase_index, 3);
    }

    #[test]
    fn test_elapsed_minutes_floors() {
        let mut run = started(SessionConfig::default());
        for _ in 0..90 {
            run.advance();
        }
        assert_eq!(run.elapsed_seconds(), 90);
        assert_eq!(run.elapsed_minutes(), 1);
    }

    #[test]
    fn test_record_steps_never_decreases() {
        let mut run = started(SessionConfig::default());
        run.record_steps(5);
        run.record_steps(3);
        assert_eq!(run.step_count, 5);
    }

    #[test]
    fn test_total_phases() {
        assert_eq!(SessionConfig::default().total_phases(), 10);
        assert_eq!(SessionConfig::new(60, 90, 100).unwrap().total_phases(), 2);
    }

    #[test]
    fn test_total_phases_with_huge_phases() {
        let half = u32::MAX / 2 + 1;
        let config = SessionConfig::new(half, half, 1800).unwrap();
        assert_eq!(config.total_phases(), 2);

        let config: SessionConfig = serde_json::from_str(
            r#"{"fastPhaseSeconds":4294967295,"slowPhaseSeconds":1,"totalDurationSeconds":1800}"#,
        )
        .unwrap();
        assert_eq!(config.total_phases(), 2);

        let config = SessionConfig::new(1, 1, u32::MAX).unwrap();
        assert_eq!(config.total_phases(), u32::MAX);
    }

    #[test]
    fn test_zero_duration_rejected() {
        assert_eq!(
            SessionConfig::new(0, 180, 1800),
            Err(ConfigError::ZeroDuration {
                field: "fast_phase_seconds"
            })
        );
        assert!(SessionConfig::new(180, 180, 0).is_err());
    }

    #[test]
    fn test_walk_state_serializes_upper_case() {
        let json = serde_json::to_string(&WalkState::Finished).unwrap();
        assert_eq!(json, "\"FINISHED\"");
        assert!(WalkState::Finished.can_start());
        assert_eq!(WalkState::default(), WalkState::Idle);
        assert!(!WalkState::Slow.can_start());
    }
}
