use std::sync::Arc;

use tokio::sync::Notify;

use crate::{
    history::HistoryError,
    i18n::{Catalog, Translator},
    models::SessionRecord,
    timer::{SessionObserver, WalkState},
};

/// Bare terminal view; prints each notification as a line.
pub struct ConsoleView {
    catalog: Arc<Catalog>,
    completed: Notify,
}

impl ConsoleView {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            completed: Notify::new(),
        }
    }

    pub async fn wait_for_completion(&self) {
        self.completed.notified().await;
    }

    pub fn print_history(&self, records: &[SessionRecord]) {
        if records.is_empty() {
            println!("{}", self.catalog.translate("history.empty", &[]));
            return;
        }
        for record in records {
            println!(
                "{}  {} min  {} steps  {}",
                record.date.format("%Y-%m-%d %H:%M"),
                record.duration_minutes,
                record.steps,
                if record.completed { "done" } else { "stopped" }
            );
        }
    }
}

pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

impl SessionObserver for ConsoleView {
    fn on_mode_changed(&self, mode: WalkState) {
        println!("== {} ==", self.catalog.mode_label(mode));
    }

    fn on_timer_updated(&self, seconds_remaining_in_interval: u32) {
        println!("{}", format_clock(seconds_remaining_in_interval));
    }

    fn on_stats_updated(&self, steps: Option<u32>, phase_index: Option<u32>) {
        if let Some(steps) = steps {
            println!("{}: {}", self.catalog.translate("stat.steps", &[]), steps);
        }
        if let Some(phase) = phase_index {
            println!("{}: {}", self.catalog.translate("stat.phase", &[]), phase);
        }
    }

    fn on_session_complete(&self, summary: &str) {
        println!("{summary}");
        self.completed.notify_one();
    }

    fn on_history_error(&self, error: &HistoryError) {
        eprintln!("{error}");
    }
}
