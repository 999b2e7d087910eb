pub mod cues;
pub mod tone;

use tone::{Tone, ToneSpec};

use rodio::{OutputStream, OutputStreamHandle, Source};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;
use std::time::Duration;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Cues shorter than this are silenced by mute; longer alerts always play.
pub const MUTE_THRESHOLD: Duration = Duration::from_millis(500);

/// Output device able to play scheduled tones. Playback is fire-and-forget.
pub trait ToneSink: Send + Sync {
    fn open(&self) -> Result<(), String>;

    fn play(&self, tones: Vec<ToneSpec>);
}

enum AudioCommand {
    Open,
    Play(Vec<ToneSpec>),
}

/// Speaker output through rodio. The stream is created on a dedicated thread
/// because rodio output objects are not `Send`.
pub struct RodioSink {
    tx: Mutex<Option<Sender<AudioCommand>>>,
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RodioSink {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>, String> {
        let mut guard = self.tx.lock().map_err(|e| e.to_string())?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut output: Option<(OutputStream, OutputStreamHandle)> = None;

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::Open => {
                            if output.is_some() {
                                continue;
                            }
                            match OutputStream::try_default() {
                                Ok(stream) => {
                                    log_info!("audio output opened");
                                    output = Some(stream);
                                }
                                Err(e) => {
                                    log_warn!("no audio output, cues disabled: {}", e);
                                }
                            }
                        }
                        AudioCommand::Play(tones) => {
                            let Some((_, ref handle)) = output else {
                                continue;
                            };
                            for spec in tones {
                                let source = Tone::new(spec).delay(spec.offset);
                                if let Err(e) = handle.play_raw(source) {
                                    log_debug!("dropped cue tone: {}", e);
                                }
                            }
                        }
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        *guard = Some(tx.clone());
        Ok(tx)
    }
}

impl ToneSink for RodioSink {
    fn open(&self) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(AudioCommand::Open).map_err(|e| e.to_string())
    }

    fn play(&self, tones: Vec<ToneSpec>) {
        let sender = self.tx.lock().ok().and_then(|guard| guard.clone());
        if let Some(tx) = sender {
            let _ = tx.send(AudioCommand::Play(tones));
        }
    }
}

/// Tick, phase and completion cues with a mute switch for the short ones.
pub struct CueEngine {
    sink: Arc<dyn ToneSink>,
    initialized: AtomicBool,
    muted: AtomicBool,
}

impl CueEngine {
    pub fn new(sink: Arc<dyn ToneSink>) -> Self {
        Self {
            sink,
            initialized: AtomicBool::new(false),
            muted: AtomicBool::new(false),
        }
    }

    /// Opens the output device on first use. Must come from a user action on
    /// platforms that gate audio behind a gesture.
    pub fn initialize(&self) {
        if self.initialized.load(Ordering::SeqCst) {
            return;
        }
        match self.sink.open() {
            Ok(()) => self.initialized.store(true, Ordering::SeqCst),
            Err(e) => log_warn!("audio cues unavailable: {}", e),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn set_muted(&self, muted: bool) -> bool {
        self.muted.store(muted, Ordering::SeqCst);
        muted
    }

    pub fn toggle_mute(&self) -> bool {
        !self.muted.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn play_tick(&self, is_fast_phase: bool) {
        if is_fast_phase {
            self.emit(cues::knock());
        } else {
            self.emit(cues::tock());
        }
    }

    pub fn play_phase_transition(&self) {
        self.emit(cues::gong());
    }

    pub fn play_session_complete(&self) {
        self.emit(cues::bell());
    }

    fn emit(&self, tones: Vec<ToneSpec>) {
        if !self.is_initialized() {
            return;
        }

        let audible: Vec<ToneSpec> = if self.is_muted() {
            tones
                .into_iter()
                .filter(|tone| tone.duration >= MUTE_THRESHOLD)
                .collect()
        } else {
            tones
        };

        if !audible.is_empty() {
            self.sink.play(audible);
        }
    }
}
