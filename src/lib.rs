pub mod audio;
pub mod commands;
pub mod console;
pub mod db;
pub mod history;
pub mod i18n;
pub mod models;
pub mod sensing;
pub mod settings;
pub mod timer;
mod utils;

use std::{io::BufRead, path::PathBuf, sync::Arc, thread};

use anyhow::Result;
use log::{info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use audio::{CueEngine, RodioSink};
use commands::{AppState, Command};
use console::ConsoleView;
use db::SqliteStore;
use history::HistoryStore;
use i18n::Catalog;
use sensing::{MotionFeed, MotionSource, NoMotionSensor, SimulatedWalk, StepCounter};
use settings::SettingsStore;
use timer::SessionController;

fn data_dir() -> PathBuf {
    std::env::var_os("JWALK_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".jwalk"))
}

/// `JWALK_SIMULATE_CADENCE` (steps per minute) feeds a synthetic walk into the
/// step counter; without it there is no motion sensor on a desktop.
fn simulated_cadence() -> Option<f64> {
    std::env::var("JWALK_SIMULATE_CADENCE")
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|cadence| *cadence > 0.0)
}

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("JWalk starting up...");

    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let settings = Arc::new(SettingsStore::new(data_dir.join("settings.json"))?);
    let user_settings = settings.snapshot();

    let catalog = Arc::new(Catalog::new(user_settings.language));
    let view = Arc::new(ConsoleView::new(catalog.clone()));

    let audio = Arc::new(CueEngine::new(Arc::new(RodioSink::new())));
    audio.set_muted(user_settings.muted);

    let history = HistoryStore::new(Arc::new(SqliteStore::new(
        data_dir.join("jwalk.sqlite3"),
    )?));

    let simulation = CancellationToken::new();
    let motion: Arc<dyn MotionSource> = match simulated_cadence() {
        Some(cadence) => {
            info!("Simulating a walk at {cadence} steps/min");
            let feed = Arc::new(MotionFeed::new());
            let _walk = SimulatedWalk::new(cadence).spawn(feed.clone(), simulation.clone());
            feed
        }
        None => Arc::new(NoMotionSensor),
    };

    let controller = SessionController::new(
        settings.session_config(),
        audio,
        StepCounter::new(motion),
        history,
        view.clone(),
        catalog.clone(),
    );
    let state = AppState {
        controller,
        settings,
        catalog,
    };

    view.print_history(&commands::get_history(&state).await);
    println!("{}", commands::USAGE);
    state.controller.start_session().await;

    let mut input = spawn_input_reader()?;
    let mut input_open = true;

    loop {
        tokio::select! {
            _ = view.wait_for_completion() => break,
            result = tokio::signal::ctrl_c() => {
                result?;
                stop_and_report(&state).await;
                break;
            }
            line = input.recv(), if input_open => match line {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match line.parse::<Command>() {
                    Ok(Command::Quit) => {
                        stop_and_report(&state).await;
                        break;
                    }
                    Ok(command) => run_command(&state, &view, command).await,
                    Err(usage) => println!("{usage}"),
                },
                None => input_open = false,
            }
        }
    }

    simulation.cancel();
    Ok(())
}

/// Keyboard lines arrive over a channel from a plain thread, so a pending read
/// never holds up shutdown.
fn spawn_input_reader() -> Result<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("jwalk-input".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

async fn stop_and_report(state: &AppState) {
    match state.controller.stop_session().await {
        Some(record) => info!("Saved {} min / {} steps", record.duration_minutes, record.steps),
        None => info!("No walk saved"),
    }
}

async fn run_command(state: &AppState, view: &ConsoleView, command: Command) {
    let outcome = match command {
        Command::Toggle => {
            commands::toggle_session(state).await;
            Ok(())
        }
        Command::Mute => commands::toggle_mute(state).await.map(|muted| {
            println!("{}", if muted { "muted" } else { "sound on" });
        }),
        Command::Language => commands::toggle_language(state)
            .await
            .map(|language| println!("language: {}", language.code())),
        Command::Durations { fast, slow, total } => {
            commands::update_durations(state, fast, slow, total)
                .await
                .map(|config| {
                    println!(
                        "next walk: {}s fast / {}s slow, {} min",
                        config.fast_phase_seconds,
                        config.slow_phase_seconds,
                        config.total_minutes()
                    )
                })
        }
        Command::History => {
            view.print_history(&commands::get_history(state).await);
            Ok(())
        }
        Command::Quit => Ok(()),
    };

    if let Err(err) = outcome {
        warn!("{err}");
    }
}
