use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one finished or manually stopped walk. Never mutated once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub date: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub steps: u32,
    pub completed: bool,
}

impl SessionRecord {
    pub fn stopped(date: DateTime<Utc>, duration_minutes: u32, steps: u32) -> Self {
        Self {
            date,
            duration_minutes,
            steps,
            completed: false,
        }
    }

    pub fn completed(date: DateTime<Utc>, duration_minutes: u32, steps: u32) -> Self {
        Self {
            date,
            duration_minutes,
            steps,
            completed: true,
        }
    }
}
