use std::{sync::Arc, time::Duration};

use log::info;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    log_debug,
    view::{self, ViewEmitter},
};

use super::{BreathingPattern, BreathingSnapshot, BreathingState};

const ENABLE_LOGS: bool = false;

pub const BREATHING_EVENT: &str = "breathing-state-changed";

struct SessionTasks {
    cancel: CancellationToken,
    pacer: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

#[derive(Clone)]
pub struct BreathingController {
    state: Arc<Mutex<BreathingState>>,
    emitter: Arc<dyn ViewEmitter>,
    tasks: Arc<Mutex<Option<SessionTasks>>>,
    tick_interval: Duration,
}

impl BreathingController {
    pub fn new(emitter: Arc<dyn ViewEmitter>, pattern: BreathingPattern) -> Self {
        Self {
            state: Arc::new(Mutex::new(BreathingState::new(pattern))),
            emitter,
            tasks: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
        }
    }

    pub async fn get_snapshot(&self) -> BreathingSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn start(&self) -> BreathingSnapshot {
        let session_id = Uuid::new_v4();

        let mut state = self.state.lock().await;
        if !state.begin_session(session_id) {
            return state.snapshot();
        }
        let snapshot = state.snapshot();

        // Tasks are only swapped while the state lock is held.
        self.spawn_tasks(session_id).await;
        drop(state);

        info!("Breathing session {} started ({:?})", session_id, snapshot.pattern);
        view::emit(self.emitter.as_ref(), BREATHING_EVENT, &snapshot);

        snapshot
    }

    pub async fn stop(&self) -> BreathingSnapshot {
        let mut state = self.state.lock().await;
        if !state.stop() {
            return state.snapshot();
        }
        let snapshot = state.snapshot();
        self.cancel_tasks().await;
        drop(state);

        info!(
            "Breathing session stopped after {}s",
            snapshot.elapsed_seconds
        );
        view::emit(self.emitter.as_ref(), BREATHING_EVENT, &snapshot);

        snapshot
    }

    /// Takes effect at the next phase boundary.
    pub async fn set_pattern(&self, pattern: BreathingPattern) -> BreathingSnapshot {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.pattern = pattern;
            state.snapshot()
        };
        view::emit(self.emitter.as_ref(), BREATHING_EVENT, &snapshot);
        snapshot
    }

    async fn spawn_tasks(&self, session_id: Uuid) {
        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.take() {
            previous.shutdown();
        }

        let cancel = CancellationToken::new();
        let pacer = tokio::spawn(run_pacer(
            self.state.clone(),
            self.emitter.clone(),
            session_id,
            cancel.clone(),
        ));
        let ticker = tokio::spawn(run_ticker(
            self.state.clone(),
            self.emitter.clone(),
            session_id,
            self.tick_interval,
            cancel.clone(),
        ));

        *tasks = Some(SessionTasks {
            cancel,
            pacer,
            ticker,
        });
    }

    async fn cancel_tasks(&self) {
        if let Some(tasks) = self.tasks.lock().await.take() {
            tasks.shutdown();
        }
    }
}

impl SessionTasks {
    fn shutdown(self) {
        self.cancel.cancel();
        self.pacer.abort();
        self.ticker.abort();
    }
}

/// Walks the phase table: dwell, then advance if the session is still ours.
async fn run_pacer(
    state: Arc<Mutex<BreathingState>>,
    emitter: Arc<dyn ViewEmitter>,
    session_id: Uuid,
    cancel: CancellationToken,
) {
    loop {
        let dwell = {
            let guard = state.lock().await;
            if !guard.is_current(session_id) {
                break;
            }
            match guard.current_dwell() {
                Some(dwell) => dwell,
                None => break,
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = time::sleep(dwell) => {}
        }

        let snapshot = {
            let mut guard = state.lock().await;
            match guard.advance_phase(session_id) {
                Some(phase) => {
                    log_debug!("Breathing phase -> {:?}", phase);
                    guard.snapshot()
                }
                None => break,
            }
        };

        view::emit(emitter.as_ref(), BREATHING_EVENT, &snapshot);
    }
}

async fn run_ticker(
    state: Arc<Mutex<BreathingState>>,
    emitter: Arc<dyn ViewEmitter>,
    session_id: Uuid,
    tick_interval: Duration,
    cancel: CancellationToken,
) {
    let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let snapshot = {
            let mut guard = state.lock().await;
            match guard.tick_elapsed(session_id) {
                Some(_) => guard.snapshot(),
                None => break,
            }
        };

        view::emit(emitter.as_ref(), BREATHING_EVENT, &snapshot);
    }
}
