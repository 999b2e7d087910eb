use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::timer::WalkState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Id,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Id => "id",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Language::En => Language::Id,
            Language::Id => Language::En,
        }
    }
}

pub trait Translator: Send + Sync {
    /// Looks up `key` and substitutes `{name}` placeholders from `params`.
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String;
}

const EN: &[(&str, &str)] = &[
    ("mode.ready", "Ready"),
    ("mode.slow", "Slow Walking"),
    ("mode.fast", "Fast Walking"),
    ("mode.finished", "Finished"),
    ("stat.steps", "Step Count"),
    ("stat.phase", "Phase"),
    ("history.empty", "No sessions yet. Start walking!"),
    (
        "alert.complete",
        "Session Complete! You walked {steps} steps in {duration} minutes.",
    ),
];

const ID: &[(&str, &str)] = &[
    ("mode.ready", "Siap"),
    ("mode.slow", "Jalan Santai"),
    ("mode.fast", "Jalan Cepat"),
    ("mode.finished", "Selesai"),
    ("stat.steps", "Langkah"),
    ("stat.phase", "Fase"),
    ("history.empty", "Belum ada sesi. Ayo mulai jalan!"),
    (
        "alert.complete",
        "Sesi Selesai! Anda berjalan {steps} langkah dalam {duration} menit.",
    ),
];

/// Built-in English and Indonesian strings.
#[derive(Debug, Default)]
pub struct Catalog {
    language: RwLock<Language>,
}

impl Catalog {
    pub fn new(language: Language) -> Self {
        Self {
            language: RwLock::new(language),
        }
    }

    pub fn language(&self) -> Language {
        match self.language.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set_language(&self, language: Language) {
        match self.language.write() {
            Ok(mut guard) => *guard = language,
            Err(poisoned) => *poisoned.into_inner() = language,
        }
    }

    pub fn toggle_language(&self) -> Language {
        let next = self.language().toggled();
        self.set_language(next);
        next
    }

    pub fn mode_label(&self, mode: WalkState) -> String {
        let key = match mode {
            WalkState::Idle => "mode.ready",
            WalkState::Fast => "mode.fast",
            WalkState::Slow => "mode.slow",
            WalkState::Finished => "mode.finished",
        };
        self.translate(key, &[])
    }

    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self.language() {
            Language::En => EN,
            Language::Id => ID,
        }
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .table()
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, text)| *text)
            .unwrap_or(key);

        params
            .iter()
            .fold(template.to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}
