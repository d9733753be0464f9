pub mod bell;
pub mod commands;
pub mod om;
pub mod rain;

use bell::TempleBell;
use om::OmTone;
use rain::RainSound;

use rodio::{OutputStream, Sink};
use serde::{Deserialize, Serialize};
use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc, Mutex,
};
use std::thread;
use thiserror::Error;

use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    OutputUnavailable(String),
    #[error("audio engine is not running")]
    EngineGone,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ToneKind {
    Om,
    Bell,
    Rain,
}

impl ToneKind {
    /// Fixed per-voice attenuation applied on top of the user volume.
    /// The bell chord and the noise bed are much louder than the drone at
    /// equal gain.
    pub fn attenuation(self) -> f32 {
        match self {
            ToneKind::Om => 1.0,
            ToneKind::Bell => 0.3,
            ToneKind::Rain => 0.2,
        }
    }

    /// Output gain for a slider `volume` in 0..=100.
    pub fn gain_for(self, volume: f32) -> f32 {
        volume_to_unit(volume) * self.attenuation()
    }
}

pub fn volume_to_unit(volume: f32) -> f32 {
    volume.clamp(0.0, 100.0) / 100.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToneStatus {
    pub kind: Option<ToneKind>,
    pub volume: f32,
}

/// One live synthesis graph. Releasing it must free every output resource
/// it holds.
pub trait VoiceGraph {
    fn set_gain(&mut self, gain: f32);
    fn release(self);
}

pub trait OutputBackend {
    type Voice: VoiceGraph;

    fn open(&mut self, kind: ToneKind, gain: f32) -> Result<Self::Voice, AudioError>;
}

/// Single-voice mixer desk. Opening a voice always releases the previous one
/// first, so two graphs are never alive at once.
pub struct ToneDeck<B: OutputBackend> {
    backend: B,
    active: Option<(ToneKind, B::Voice)>,
    volume: f32,
}

impl<B: OutputBackend> ToneDeck<B> {
    pub fn new(backend: B, volume: f32) -> Self {
        Self {
            backend,
            active: None,
            volume: volume.clamp(0.0, 100.0),
        }
    }

    pub fn play(&mut self, kind: ToneKind) -> Result<(), AudioError> {
        self.stop();
        let voice = self.backend.open(kind, kind.gain_for(self.volume))?;
        self.active = Some((kind, voice));
        Ok(())
    }

    /// Returns whether a voice was released.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some((_, voice)) => {
                voice.release();
                true
            }
            None => false,
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 100.0);
        if let Some((kind, voice)) = self.active.as_mut() {
            voice.set_gain(kind.gain_for(self.volume));
        }
    }

    pub fn status(&self) -> ToneStatus {
        ToneStatus {
            kind: self.active.as_ref().map(|(kind, _)| *kind),
            volume: self.volume,
        }
    }
}

/// A voice with its own output stream, mirroring one audio context per sound.
pub struct RodioVoice {
    _stream: OutputStream,
    sink: Sink,
}

impl VoiceGraph for RodioVoice {
    fn set_gain(&mut self, gain: f32) {
        self.sink.set_volume(gain.clamp(0.0, 1.0));
    }

    fn release(self) {
        self.sink.stop();
        // Dropping the stream closes the device handle.
    }
}

pub struct RodioBackend;

impl OutputBackend for RodioBackend {
    type Voice = RodioVoice;

    fn open(&mut self, kind: ToneKind, gain: f32) -> Result<RodioVoice, AudioError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AudioError::OutputUnavailable(e.to_string()))?;
        let sink =
            Sink::try_new(&handle).map_err(|e| AudioError::OutputUnavailable(e.to_string()))?;

        sink.set_volume(gain.clamp(0.0, 1.0));
        match kind {
            ToneKind::Om => sink.append(OmTone::new()),
            ToneKind::Bell => sink.append(TempleBell::new()),
            ToneKind::Rain => sink.append(RainSound::new()),
        }

        Ok(RodioVoice {
            _stream: stream,
            sink,
        })
    }
}

type Reply<T> = Sender<Result<T, AudioError>>;

enum AudioCommand {
    Play { kind: ToneKind, reply: Reply<ToneStatus> },
    Stop { reply: Reply<ToneStatus> },
    SetVolume { volume: f32, reply: Reply<ToneStatus> },
    Status { reply: Reply<ToneStatus> },
}

fn run_engine<B: OutputBackend>(rx: Receiver<AudioCommand>, mut deck: ToneDeck<B>) {
    while let Ok(cmd) = rx.recv() {
        match cmd {
            AudioCommand::Play { kind, reply } => {
                let result = deck.play(kind).map(|_| deck.status());
                if let Err(ref err) = result {
                    log_warn!("Failed to start {:?} voice: {}", kind, err);
                } else {
                    log_info!("Playing {:?} voice", kind);
                }
                let _ = reply.send(result);
            }
            AudioCommand::Stop { reply } => {
                if deck.stop() {
                    log_info!("Voice released");
                }
                let _ = reply.send(Ok(deck.status()));
            }
            AudioCommand::SetVolume { volume, reply } => {
                deck.set_volume(volume);
                let _ = reply.send(Ok(deck.status()));
            }
            AudioCommand::Status { reply } => {
                let _ = reply.send(Ok(deck.status()));
            }
        }
    }

    deck.stop();
}

/// Handle to the audio thread. The thread is spawned on first use because
/// rodio's output stream is not `Send` and must live on one thread.
pub struct AudioEngineHandle {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
    initial_volume: f32,
}

impl AudioEngineHandle {
    pub fn new(initial_volume: f32) -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
            initial_volume: initial_volume.clamp(0.0, 100.0),
        }
    }

    fn running_sender(&self) -> Option<Sender<AudioCommand>> {
        self.tx.lock().ok().and_then(|guard| guard.clone())
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>, AudioError> {
        let mut guard = self.tx.lock().map_err(|_| AudioError::EngineGone)?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();
        let volume = self.initial_volume;

        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || run_engine(rx, ToneDeck::new(RodioBackend, volume)))
            .map_err(|e| AudioError::OutputUnavailable(e.to_string()))?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    fn request(
        &self,
        tx: Sender<AudioCommand>,
        build: impl FnOnce(Reply<ToneStatus>) -> AudioCommand,
    ) -> Result<ToneStatus, AudioError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        tx.send(build(reply_tx))
            .map_err(|_| AudioError::EngineGone)?;
        reply_rx.recv().map_err(|_| AudioError::EngineGone)?
    }

    pub fn play(&self, kind: ToneKind) -> Result<ToneStatus, AudioError> {
        let tx = self.ensure_thread()?;
        self.request(tx, |reply| AudioCommand::Play { kind, reply })
    }

    /// Safe to call when nothing is playing or the engine never started.
    pub fn stop(&self) -> Result<ToneStatus, AudioError> {
        match self.running_sender() {
            Some(tx) => self.request(tx, |reply| AudioCommand::Stop { reply }),
            None => Ok(self.idle_status()),
        }
    }

    pub fn set_volume(&self, volume: f32) -> Result<ToneStatus, AudioError> {
        let tx = self.ensure_thread()?;
        self.request(tx, |reply| AudioCommand::SetVolume { volume, reply })
    }

    pub fn status(&self) -> Result<ToneStatus, AudioError> {
        match self.running_sender() {
            Some(tx) => self.request(tx, |reply| AudioCommand::Status { reply }),
            None => Ok(self.idle_status()),
        }
    }

    fn idle_status(&self) -> ToneStatus {
        ToneStatus {
            kind: None,
            volume: self.initial_volume,
        }
    }
}
