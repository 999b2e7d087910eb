use crate::history::HistoryError;

use super::WalkState;

/// Push-based view of a session. `None` in `on_stats_updated` means the
/// displayed value should be left as is.
pub trait SessionObserver: Send + Sync {
    fn on_mode_changed(&self, mode: WalkState);

    fn on_timer_updated(&self, seconds_remaining_in_interval: u32);

    fn on_stats_updated(&self, steps: Option<u32>, phase_index: Option<u32>);

    /// Completion summary the user has to acknowledge.
    fn on_session_complete(&self, summary: &str);

    fn on_history_error(&self, _error: &HistoryError) {}
}
