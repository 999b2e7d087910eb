use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::Mutex as AsyncMutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    audio::CueEngine,
    history::{HistoryError, HistoryStore},
    i18n::Translator,
    models::SessionRecord,
    sensing::{StepCallback, StepCounter},
};

use super::{SessionConfig, SessionObserver, SessionRun, TickOutcome, WalkState};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub run: SessionRun,
    pub elapsed_seconds: u32,
    pub total_phases: u32,
}

impl From<&SessionRun> for SessionSnapshot {
    fn from(run: &SessionRun) -> Self {
        Self {
            elapsed_seconds: run.elapsed_seconds(),
            total_phases: run.config.total_phases(),
            run: run.clone(),
        }
    }
}

/// What a run looked like at the moment it left the active states.
struct EndedRun {
    run_id: String,
    started_at: DateTime<Utc>,
    elapsed_minutes: u32,
    total_minutes: u32,
    steps: u32,
    ticker: Option<JoinHandle<()>>,
}

/// Owns the session run and drives cues, step counting, history and the
/// presentation observer from a one-second ticker.
#[derive(Clone)]
pub struct SessionController {
    run: Arc<Mutex<SessionRun>>,
    audio: Arc<CueEngine>,
    steps: Arc<AsyncMutex<StepCounter>>,
    history: HistoryStore,
    observer: Arc<dyn SessionObserver>,
    translator: Arc<dyn Translator>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    debug_ticks: bool,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        audio: Arc<CueEngine>,
        step_counter: StepCounter,
        history: HistoryStore,
        observer: Arc<dyn SessionObserver>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let debug_ticks = std::env::var("JWALK_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            run: Arc::new(Mutex::new(SessionRun::new(config))),
            audio,
            steps: Arc::new(AsyncMutex::new(step_counter)),
            history,
            observer,
            translator,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            debug_ticks,
        }
    }

    pub fn audio(&self) -> &CueEngine {
        &self.audio
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn state(&self) -> WalkState {
        lock(&self.run).state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&*lock(&self.run))
    }

    /// Replaces the timing used by the next run. Refused while a run is active.
    pub fn reconfigure(&self, config: SessionConfig) -> bool {
        let mut run = lock(&self.run);
        if run.state.is_active() {
            log_warn!("reconfigure ignored while {}", run.state.as_str());
            return false;
        }
        run.config = config;
        true
    }

    /// Start/stop button semantics: starts when idle or finished, stops otherwise.
    pub async fn toggle(&self) -> WalkState {
        if self.state().can_start() {
            self.start_session().await;
        } else {
            self.stop_session().await;
        }
        self.state()
    }

    /// Begins a new run in the fast phase. A no-op while a run is active.
    pub async fn start_session(&self) -> SessionSnapshot {
        self.audio.initialize();

        let (run_id, snapshot) = {
            let mut run = lock(&self.run);
            if !run.state.can_start() {
                log_warn!(
                    "start ignored: session {} already {}",
                    run.run_id.as_deref().unwrap_or("?"),
                    run.state.as_str()
                );
                return SessionSnapshot::from(&*run);
            }

            let run_id = Uuid::new_v4().to_string();
            run.begin(run_id.clone(), Utc::now());
            (run_id, SessionSnapshot::from(&*run))
        };

        log_info!(
            "session {} started: {}s total, {}s fast / {}s slow",
            run_id,
            snapshot.run.config.total_duration_seconds,
            snapshot.run.config.fast_phase_seconds,
            snapshot.run.config.slow_phase_seconds
        );

        self.observer.on_mode_changed(WalkState::Fast);
        self.observer
            .on_timer_updated(snapshot.run.seconds_remaining_interval);
        self.observer
            .on_stats_updated(Some(0), Some(snapshot.run.current_phase_index));

        let on_step = self.step_callback(run_id.clone());
        self.steps.lock().await.activate(on_step);

        self.spawn_ticker(run_id);

        snapshot
    }

    /// Ends an active run early. Runs shorter than one minute leave no record.
    pub async fn stop_session(&self) -> Option<SessionRecord> {
        let ended = self.end_run(WalkState::Idle)?;
        if let Some(handle) = ended.ticker {
            handle.abort();
        }

        self.deactivate_steps(&ended.run_id).await;
        if self.is_current(&ended.run_id) {
            self.observer.on_mode_changed(WalkState::Idle);
        }

        if ended.elapsed_minutes < 1 {
            log_info!(
                "session {} stopped under a minute; not recorded",
                ended.run_id
            );
            return None;
        }

        log_info!(
            "session {} stopped after {} min, {} steps",
            ended.run_id,
            ended.elapsed_minutes,
            ended.steps
        );
        let record = SessionRecord::stopped(ended.started_at, ended.elapsed_minutes, ended.steps);
        self.persist(&ended.run_id, &record).await;
        Some(record)
    }

    async fn finish_session(&self) {
        let Some(mut ended) = self.end_run(WalkState::Finished) else {
            return;
        };
        // Runs on the ticker task itself, so the handle is released, not aborted.
        drop(ended.ticker.take());
        self.wrap_up_finished(ended).await;
    }

    /// Everything after the FINISHED claim. A run started while this awaits
    /// owns the observer from then on, so notifications for the old run stop.
    async fn wrap_up_finished(&self, ended: EndedRun) {
        self.deactivate_steps(&ended.run_id).await;
        if self.is_current(&ended.run_id) {
            self.audio.play_session_complete();
            self.observer.on_mode_changed(WalkState::Finished);
        }

        let duration_minutes = ended.total_minutes;
        log_info!(
            "session {} completed: {} min, {} steps",
            ended.run_id,
            duration_minutes,
            ended.steps
        );

        let record = SessionRecord::completed(ended.started_at, duration_minutes, ended.steps);
        self.persist(&ended.run_id, &record).await;

        if !self.is_current(&ended.run_id) {
            log_info!("session {} superseded; summary dropped", ended.run_id);
            return;
        }

        let summary = self.translator.translate(
            "alert.complete",
            &[
                ("steps", ended.steps.to_string()),
                ("duration", duration_minutes.to_string()),
            ],
        );
        self.observer.on_session_complete(&summary);
    }

    /// Moves an active run to `next` and detaches its ticker, atomically with
    /// respect to ticks and step events.
    fn end_run(&self, next: WalkState) -> Option<EndedRun> {
        let mut run = lock(&self.run);
        if !run.state.is_active() {
            return None;
        }

        let ended = EndedRun {
            run_id: run.run_id.clone().unwrap_or_default(),
            started_at: run.started_at.unwrap_or_else(Utc::now),
            elapsed_minutes: run.elapsed_minutes(),
            total_minutes: run.config.total_minutes(),
            steps: run.step_count,
            ticker: lock(&self.ticker).take(),
        };

        match next {
            WalkState::Finished => run.complete(),
            _ => run.halt(),
        }

        Some(ended)
    }

    fn spawn_ticker(&self, run_id: String) {
        let mut ticker_guard = lock(&self.ticker);
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let controller = self.clone();
        let period = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !controller.handle_tick(&run_id).await {
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    /// One countdown second. Returns false once the ticker should exit.
    async fn handle_tick(&self, run_id: &str) -> bool {
        let outcome = {
            let mut run = lock(&self.run);
            if !run.state.is_active() || !run.is_run(run_id) {
                return false;
            }
            run.advance()
        };

        let TickOutcome::Advanced { phase, phase_ended } = outcome else {
            self.finish_session().await;
            return false;
        };

        self.audio.play_tick(phase == WalkState::Fast);

        if phase_ended {
            self.switch_phase(run_id);
        }

        let (remaining_total, remaining_interval) = {
            let run = lock(&self.run);
            (run.seconds_remaining_total, run.seconds_remaining_interval)
        };

        if self.debug_ticks {
            log_debug!(
                "tick {}: {} {}s left in phase, {}s total",
                run_id,
                phase.as_str(),
                remaining_interval,
                remaining_total
            );
        }

        self.observer.on_timer_updated(remaining_interval);
        true
    }

    fn switch_phase(&self, run_id: &str) {
        let (state, phase_index) = {
            let mut run = lock(&self.run);
            if !run.state.is_active() || !run.is_run(run_id) {
                return;
            }
            let state = run.switch_phase();
            (state, run.current_phase_index)
        };

        self.audio.play_phase_transition();
        log_info!(
            "session {} phase {} -> {}",
            run_id,
            phase_index,
            state.as_str()
        );

        self.observer.on_mode_changed(state);
        self.observer.on_stats_updated(None, Some(phase_index));
    }

    fn step_callback(&self, run_id: String) -> StepCallback {
        let run = self.run.clone();
        let observer = self.observer.clone();

        Box::new(move |cumulative| {
            let steps = {
                let mut guard = lock(&run);
                if !guard.state.is_active() || !guard.is_run(&run_id) {
                    return;
                }
                guard.record_steps(cumulative);
                guard.step_count
            };
            observer.on_stats_updated(Some(steps), None);
        })
    }

    fn is_current(&self, run_id: &str) -> bool {
        lock(&self.run).is_run(run_id)
    }

    /// Stops the step loop of `run_id`. A newer run activates under the same
    /// async lock, so its loop is never the one cancelled here.
    async fn deactivate_steps(&self, run_id: &str) {
        let mut steps = self.steps.lock().await;
        if !self.is_current(run_id) {
            return;
        }
        if let Err(err) = steps.deactivate().await {
            log_error!("Failed to stop step counter: {:#}", err);
        }
    }

    /// Writes on the blocking pool; the store may do file I/O.
    async fn persist(&self, run_id: &str, record: &SessionRecord) {
        let history = self.history.clone();
        let pending = record.clone();
        let result = match tokio::task::spawn_blocking(move || history.append(pending)).await {
            Ok(result) => result,
            Err(join_err) => Err(HistoryError::WriteFailed(anyhow!(
                "history writer stopped: {join_err}"
            ))),
        };

        match result {
            Ok(()) => log_info!("session {} saved to history", run_id),
            Err(err) => {
                log_error!("session {}: {}", run_id, err);
                self.observer.on_history_error(&err);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
