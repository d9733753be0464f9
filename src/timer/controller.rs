use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::info;
use serde::Serialize;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant},
};

use crate::{
    log_debug,
    view::{self, ViewEmitter},
};

use super::{TickOutcome, TimerSnapshot, TimerState, TimerStatus};

const ENABLE_LOGS: bool = false;

pub const TIMER_STATE_EVENT: &str = "timer-state-changed";
pub const TIMER_COMPLETED_EVENT: &str = "timer-completed";

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct TimerCompletedEvent {
    selected_minutes: u32,
}

type TaskSlot = Arc<Mutex<Option<JoinHandle<()>>>>;

#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    emitter: Arc<dyn ViewEmitter>,
    ticker: TaskSlot,
    pending_reset: TaskSlot,
    tick_interval: Duration,
    reset_delay: Duration,
}

impl TimerController {
    pub fn new(emitter: Arc<dyn ViewEmitter>, default_minutes: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::new(default_minutes))),
            emitter,
            ticker: Arc::new(Mutex::new(None)),
            pending_reset: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            reset_delay: Duration::from_secs(3),
        }
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Ignored while running. Cancels a pending post-completion reset.
    pub async fn select_duration(&self, minutes: u32) -> Result<TimerSnapshot> {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !state.select_duration(minutes)? {
                return Ok(state.snapshot());
            }
            state.snapshot()
        };

        abort_slot(&self.pending_reset).await;
        self.emit_state(&snapshot);
        Ok(snapshot)
    }

    pub async fn start_timer(&self) -> TimerSnapshot {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !state.start() {
                return state.snapshot();
            }
            state.snapshot()
        };

        info!(
            "Meditation timer running, {}s remaining",
            snapshot.remaining_seconds
        );
        self.spawn_ticker().await;
        self.emit_state(&snapshot);
        snapshot
    }

    /// Halts in place; start resumes from the remaining time.
    pub async fn stop_timer(&self) -> TimerSnapshot {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !state.stop() {
                return state.snapshot();
            }
            state.snapshot()
        };

        abort_slot(&self.ticker).await;
        info!(
            "Meditation timer paused, {}s remaining",
            snapshot.remaining_seconds
        );
        self.emit_state(&snapshot);
        snapshot
    }

    /// Stops every task the timer owns. Used on window teardown.
    pub async fn shutdown(&self) {
        self.state.lock().await.stop();
        abort_slot(&self.ticker).await;
        abort_slot(&self.pending_reset).await;
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let emitter = self.emitter.clone();
        let pending_reset = self.pending_reset.clone();
        let tick_interval = self.tick_interval;
        let reset_delay = self.reset_delay;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            loop {
                interval.tick().await;

                let (outcome, snapshot) = {
                    let mut guard = state.lock().await;
                    let outcome = guard.tick();
                    (outcome, guard.snapshot())
                };

                match outcome {
                    TickOutcome::Ignored => break,
                    TickOutcome::Running => {
                        log_debug!("Timer tick, {}s remaining", snapshot.remaining_seconds);
                        view::emit(emitter.as_ref(), TIMER_STATE_EVENT, &snapshot);
                    }
                    TickOutcome::Completed => {
                        info!("Meditation timer completed");
                        view::emit(emitter.as_ref(), TIMER_STATE_EVENT, &snapshot);
                        view::emit(
                            emitter.as_ref(),
                            TIMER_COMPLETED_EVENT,
                            &TimerCompletedEvent {
                                selected_minutes: snapshot.selected_minutes,
                            },
                        );

                        let reset = tokio::spawn(reset_after(
                            state.clone(),
                            emitter.clone(),
                            reset_delay,
                        ));
                        if let Some(previous) = pending_reset.lock().await.replace(reset) {
                            previous.abort();
                        }
                        break;
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    fn emit_state(&self, snapshot: &TimerSnapshot) {
        view::emit(self.emitter.as_ref(), TIMER_STATE_EVENT, snapshot);
    }
}

async fn reset_after(state: Arc<Mutex<TimerState>>, emitter: Arc<dyn ViewEmitter>, delay: Duration) {
    time::sleep(delay).await;

    let snapshot = {
        let mut guard = state.lock().await;
        if guard.status != TimerStatus::Completed {
            return;
        }
        guard.reset_to_selection();
        guard.snapshot()
    };

    view::emit(emitter.as_ref(), TIMER_STATE_EVENT, &snapshot);
}

async fn abort_slot(slot: &TaskSlot) {
    if let Some(handle) = slot.lock().await.take() {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{ring_circumference, DURATION_CHOICES};
    use crate::view::testing::RecordingEmitter;

    fn controller() -> (TimerController, Arc<RecordingEmitter>) {
        let recorder = Arc::new(RecordingEmitter::default());
        (TimerController::new(recorder.clone(), 5), recorder)
    }

    #[tokio::test(start_paused = true)]
    async fn select_duration_updates_display_immediately() {
        let (controller, recorder) = controller();

        for minutes in DURATION_CHOICES {
            let snapshot = controller.select_duration(minutes).await.unwrap();
            assert_eq!(snapshot.display, format!("{minutes:02}:00"));
            assert!((snapshot.ring_offset - ring_circumference()).abs() < 1e-9);
        }

        assert_eq!(recorder.named(TIMER_STATE_EVENT).len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn full_run_completes_once_and_auto_resets() {
        let (controller, recorder) = controller();

        controller.start_timer().await;
        time::sleep(Duration::from_millis(300_500)).await;

        let snapshot = controller.get_snapshot().await;
        assert_eq!(snapshot.status, TimerStatus::Completed);
        assert_eq!(snapshot.remaining_seconds, 0);

        let zero_ticks = recorder
            .named(TIMER_STATE_EVENT)
            .iter()
            .filter(|payload| payload["remainingSeconds"] == 0)
            .count();
        assert_eq!(zero_ticks, 1);
        assert_eq!(recorder.named(TIMER_COMPLETED_EVENT).len(), 1);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(controller.get_snapshot().await.status, TimerStatus::Completed);

        time::sleep(Duration::from_secs(1)).await;
        let snapshot = controller.get_snapshot().await;
        assert_eq!(snapshot.status, TimerStatus::Idle);
        assert_eq!(snapshot.remaining_seconds, 300);
        assert_eq!(snapshot.total_seconds, 300);
        assert_eq!(snapshot.display, "05:00");
        assert_eq!(snapshot.action_label, "Start");
        assert_eq!(recorder.named(TIMER_COMPLETED_EVENT).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_in_place_and_start_resumes() {
        let (controller, recorder) = controller();

        controller.start_timer().await;
        time::sleep(Duration::from_millis(10_500)).await;
        let paused = controller.stop_timer().await;
        assert_eq!(paused.remaining_seconds, 290);
        assert_eq!(paused.status, TimerStatus::Idle);

        recorder.clear();
        time::sleep(Duration::from_secs(30)).await;
        assert!(recorder.events().is_empty());

        controller.start_timer().await;
        time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(controller.get_snapshot().await.remaining_seconds, 285);
        controller.stop_timer().await;
    }

    #[tokio::test(start_paused = true)]
    async fn duration_change_is_rejected_while_running() {
        let (controller, _) = controller();

        controller.start_timer().await;
        time::sleep(Duration::from_millis(1_500)).await;
        let snapshot = controller.select_duration(20).await.unwrap();

        assert_eq!(snapshot.status, TimerStatus::Running);
        assert_eq!(snapshot.selected_minutes, 5);
        assert_eq!(snapshot.remaining_seconds, 299);
        controller.stop_timer().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_when_idle_is_a_no_op() {
        let (controller, recorder) = controller();

        let snapshot = controller.stop_timer().await;

        assert_eq!(snapshot.status, TimerStatus::Idle);
        assert_eq!(snapshot.remaining_seconds, 300);
        assert!(recorder.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_during_completion_window_cancels_the_reset() {
        let (controller, _) = controller();

        controller.start_timer().await;
        time::sleep(Duration::from_millis(300_500)).await;
        controller.select_duration(10).await.unwrap();
        time::sleep(Duration::from_secs(5)).await;

        let snapshot = controller.get_snapshot().await;
        assert_eq!(snapshot.selected_minutes, 10);
        assert_eq!(snapshot.remaining_seconds, 600);
    }
}
