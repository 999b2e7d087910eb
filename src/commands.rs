use std::{str::FromStr, sync::Arc};

use crate::{
    i18n::{Catalog, Language},
    models::SessionRecord,
    settings::SettingsStore,
    timer::{SessionConfig, SessionController, WalkState},
};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Handles the terminal front end acts on.
#[derive(Clone)]
pub struct AppState {
    pub controller: SessionController,
    pub settings: Arc<SettingsStore>,
    pub catalog: Arc<Catalog>,
}

/// One line of keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Mute,
    Language,
    Durations { fast: u32, slow: u32, total: u32 },
    History,
    Quit,
}

pub const USAGE: &str =
    "s = start/stop, m = mute, l = language, d <fast> <slow> <total> = durations (s), h = history, q = quit";

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some("s") => Command::Toggle,
            Some("m") => Command::Mute,
            Some("l") => Command::Language,
            Some("h") => Command::History,
            Some("q") => Command::Quit,
            Some("d") => {
                let mut next = || -> Result<u32, String> {
                    let word = words.next().ok_or_else(|| USAGE.to_string())?;
                    word.parse()
                        .map_err(|_| format!("not a number of seconds: {word}"))
                };
                Command::Durations {
                    fast: next()?,
                    slow: next()?,
                    total: next()?,
                }
            }
            _ => return Err(USAGE.to_string()),
        };

        if words.next().is_some() {
            return Err(USAGE.to_string());
        }
        Ok(command)
    }
}

async fn save_settings<F>(state: &AppState, apply: F) -> Result<(), String>
where
    F: FnOnce(&SettingsStore) -> anyhow::Result<()> + Send + 'static,
{
    let settings = state.settings.clone();
    tokio::task::spawn_blocking(move || apply(&settings))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| format!("{e:#}"))
}

pub async fn toggle_session(state: &AppState) -> WalkState {
    state.controller.toggle().await
}

/// Flips mute and saves it for the next launch. The live switch keeps its new
/// value even if saving fails.
pub async fn toggle_mute(state: &AppState) -> Result<bool, String> {
    let muted = state.controller.audio().toggle_mute();
    log_info!("mute {}", if muted { "on" } else { "off" });
    save_settings(state, move |settings| settings.set_muted(muted)).await?;
    Ok(muted)
}

pub async fn toggle_language(state: &AppState) -> Result<Language, String> {
    let language = state.catalog.toggle_language();
    log_info!("language switched to {}", language.code());
    save_settings(state, move |settings| settings.set_language(language)).await?;
    Ok(language)
}

/// New phase lengths for the next walk. Refused while a walk is running.
pub async fn update_durations(
    state: &AppState,
    fast: u32,
    slow: u32,
    total: u32,
) -> Result<SessionConfig, String> {
    let config = SessionConfig::new(fast, slow, total).map_err(|e| e.to_string())?;
    if !state.controller.reconfigure(config) {
        log_warn!("durations unchanged; a walk is in progress");
        return Err("stop the current walk before changing durations".to_string());
    }
    save_settings(state, move |settings| settings.update_session_config(config)).await?;
    Ok(config)
}

pub async fn get_history(state: &AppState) -> Vec<SessionRecord> {
    let history = state.controller.history().clone();
    tokio::task::spawn_blocking(move || history.list_or_empty())
        .await
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{tone::ToneSpec, CueEngine, ToneSink},
        db::MemoryStore,
        history::HistoryStore,
        sensing::{NoMotionSensor, StepCounter},
        timer::SessionObserver,
    };
    use std::path::Path;

    struct Silent;

    impl ToneSink for Silent {
        fn open(&self) -> Result<(), String> {
            Ok(())
        }

        fn play(&self, _tones: Vec<ToneSpec>) {}
    }

    struct Quiet;

    impl SessionObserver for Quiet {
        fn on_mode_changed(&self, _mode: WalkState) {}
        fn on_timer_updated(&self, _seconds: u32) {}
        fn on_stats_updated(&self, _steps: Option<u32>, _phase_index: Option<u32>) {}
        fn on_session_complete(&self, _summary: &str) {}
    }

    fn app_state(settings_path: &Path) -> AppState {
        let settings = Arc::new(SettingsStore::new(settings_path.to_path_buf()).unwrap());
        let snapshot = settings.snapshot();
        let catalog = Arc::new(Catalog::new(snapshot.language));
        let audio = Arc::new(CueEngine::new(Arc::new(Silent)));
        audio.set_muted(snapshot.muted);

        let controller = SessionController::new(
            settings.session_config(),
            audio,
            StepCounter::new(Arc::new(NoMotionSensor)),
            HistoryStore::new(Arc::new(MemoryStore::new())),
            Arc::new(Quiet),
            catalog.clone(),
        );

        AppState {
            controller,
            settings,
            catalog,
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("s".parse::<Command>(), Ok(Command::Toggle));
        assert_eq!(" m ".parse::<Command>(), Ok(Command::Mute));
        assert_eq!(
            "d 120 60 900".parse::<Command>(),
            Ok(Command::Durations {
                fast: 120,
                slow: 60,
                total: 900
            })
        );
        assert!("d 120 60".parse::<Command>().is_err());
        assert!("d 120 sixty 900".parse::<Command>().is_err());
        assert!("q now".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn test_mute_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let state = app_state(&path);
        assert!(toggle_mute(&state).await.unwrap());
        assert!(state.controller.audio().is_muted());

        let relaunched = app_state(&path);
        assert!(relaunched.settings.snapshot().muted);
        assert!(relaunched.controller.audio().is_muted());

        assert!(!toggle_mute(&relaunched).await.unwrap());
        assert!(!SettingsStore::new(path).unwrap().snapshot().muted);
    }

    #[tokio::test]
    async fn test_language_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let state = app_state(&path);
        assert_eq!(toggle_language(&state).await.unwrap(), Language::Id);

        let relaunched = app_state(&path);
        assert_eq!(relaunched.catalog.language(), Language::Id);
        assert_eq!(relaunched.catalog.mode_label(WalkState::Fast), "Jalan Cepat");
    }

    #[tokio::test]
    async fn test_durations_saved_only_when_idle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let state = app_state(&path);

        state.controller.start_session().await;
        assert!(update_durations(&state, 60, 60, 600).await.is_err());
        state.controller.stop_session().await;

        assert!(update_durations(&state, 0, 60, 600).await.is_err());
        let config = update_durations(&state, 60, 90, 600).await.unwrap();

        let relaunched = app_state(&path);
        assert_eq!(relaunched.settings.session_config(), config);
        let snapshot = relaunched.controller.start_session().await;
        assert_eq!(snapshot.run.seconds_remaining_total, 600);
        relaunched.controller.stop_session().await;
    }
}
