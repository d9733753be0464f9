pub mod commands;
pub mod gate;
pub mod probe;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use log::info;
use tokio::{sync::Mutex, time};

use crate::view::{self, ViewEmitter};

pub use gate::{ConnectivityGate, GateTransition, GateView};
pub use probe::{ReachabilityProbe, TcpProbe};

pub const CONNECTIVITY_EVENT: &str = "connectivity-changed";

/// What happens to the rest of the app when the gate flips.
#[async_trait]
pub trait GateHooks: Send + Sync {
    async fn entered_sanctuary(&self);
    async fn entered_prompt(&self);
}

/// Feeds the gate from a polled probe and from the webview's own signal.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    gate: Arc<Mutex<ConnectivityGate>>,
    probe: Arc<dyn ReachabilityProbe>,
    hooks: Arc<dyn GateHooks>,
    emitter: Arc<dyn ViewEmitter>,
    poll_interval: Duration,
}

impl ConnectivityMonitor {
    pub fn new(
        probe: Arc<dyn ReachabilityProbe>,
        hooks: Arc<dyn GateHooks>,
        emitter: Arc<dyn ViewEmitter>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            gate: Arc::new(Mutex::new(ConnectivityGate::new())),
            probe,
            hooks,
            emitter,
            poll_interval,
        }
    }

    pub async fn current(&self) -> Option<GateTransition> {
        self.gate.lock().await.current()
    }

    /// The gate stays locked until the view and hooks have caught up, so
    /// transitions from the poll loop and from webview reports apply in order.
    pub async fn observe(&self, online: bool) -> Option<GateTransition> {
        let mut gate = self.gate.lock().await;
        let transition = gate.observe(online)?;

        info!(
            "Connectivity changed: {} -> showing {:?}",
            if online { "online" } else { "offline" },
            transition.view
        );
        view::emit(self.emitter.as_ref(), CONNECTIVITY_EVENT, &transition);

        match transition.view {
            GateView::Sanctuary => self.hooks.entered_sanctuary().await,
            GateView::Prompt => self.hooks.entered_prompt().await,
        }
        drop(gate);

        Some(transition)
    }

    pub async fn probe_once(&self) -> Option<GateTransition> {
        let online = self.probe.is_reachable().await;
        self.observe(online).await
    }

    /// A webview "offline" report is trusted as is. An "online" report only
    /// prompts an immediate probe, so a LAN without internet does not flap
    /// the gate.
    pub async fn report(&self, online: bool) -> Option<GateTransition> {
        if online {
            self.probe_once().await
        } else {
            self.observe(false).await
        }
    }

    /// Polls until the task is dropped. The first probe runs immediately.
    pub async fn run(self) {
        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.probe_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::testing::RecordingEmitter;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct FakeProbe {
        reachable: AtomicBool,
    }

    #[async_trait]
    impl ReachabilityProbe for FakeProbe {
        async fn is_reachable(&self) -> bool {
            self.reachable.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct CountingHooks {
        sanctuary: AtomicUsize,
        prompt: AtomicUsize,
    }

    #[async_trait]
    impl GateHooks for CountingHooks {
        async fn entered_sanctuary(&self) {
            self.sanctuary.fetch_add(1, Ordering::SeqCst);
        }

        async fn entered_prompt(&self) {
            self.prompt.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        monitor: ConnectivityMonitor,
        probe: Arc<FakeProbe>,
        hooks: Arc<CountingHooks>,
        recorder: Arc<RecordingEmitter>,
    }

    fn fixture(reachable: bool) -> Fixture {
        let probe = Arc::new(FakeProbe {
            reachable: AtomicBool::new(reachable),
        });
        let hooks = Arc::new(CountingHooks::default());
        let recorder = Arc::new(RecordingEmitter::default());
        let monitor = ConnectivityMonitor::new(
            probe.clone(),
            hooks.clone(),
            recorder.clone(),
            Duration::from_secs(5),
        );
        Fixture {
            monitor,
            probe,
            hooks,
            recorder,
        }
    }

    #[tokio::test]
    async fn first_probe_shows_a_view() {
        let f = fixture(true);

        let transition = f.monitor.probe_once().await.unwrap();

        assert_eq!(transition.view, GateView::Prompt);
        assert_eq!(f.recorder.named(CONNECTIVITY_EVENT).len(), 1);
        assert_eq!(f.hooks.prompt.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unchanged_signal_emits_nothing() {
        let f = fixture(false);
        f.monitor.probe_once().await;

        assert_eq!(f.monitor.probe_once().await, None);
        assert_eq!(f.recorder.named(CONNECTIVITY_EVENT).len(), 1);
        assert_eq!(f.hooks.sanctuary.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn going_offline_enters_the_sanctuary() {
        let f = fixture(true);
        f.monitor.probe_once().await;

        f.probe.reachable.store(false, Ordering::SeqCst);
        let transition = f.monitor.probe_once().await.unwrap();

        assert_eq!(transition.view, GateView::Sanctuary);
        assert!(transition.replay_entry_animations);
        let payload = &f.recorder.named(CONNECTIVITY_EVENT)[1];
        assert_eq!(payload["view"], "sanctuary");
        assert_eq!(payload["replayEntryAnimations"], true);
        assert_eq!(f.hooks.sanctuary.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn webview_offline_report_is_applied_directly() {
        let f = fixture(true);
        f.monitor.probe_once().await;

        let transition = f.monitor.report(false).await.unwrap();

        assert_eq!(transition.view, GateView::Sanctuary);
    }

    #[tokio::test]
    async fn webview_online_report_is_confirmed_by_probe() {
        let f = fixture(false);
        f.monitor.probe_once().await;

        assert_eq!(f.monitor.report(true).await, None);
        assert_eq!(
            f.monitor.current().await.map(|t| t.view),
            Some(GateView::Sanctuary)
        );
    }

    #[derive(Default)]
    struct SlowSanctuaryHooks {
        release: Notify,
        finished: std::sync::Mutex<Vec<GateView>>,
    }

    #[async_trait]
    impl GateHooks for SlowSanctuaryHooks {
        async fn entered_sanctuary(&self) {
            self.release.notified().await;
            self.finished.lock().unwrap().push(GateView::Sanctuary);
        }

        async fn entered_prompt(&self) {
            self.finished.lock().unwrap().push(GateView::Prompt);
        }
    }

    #[tokio::test]
    async fn overlapping_observations_apply_in_order() {
        let probe = Arc::new(FakeProbe {
            reachable: AtomicBool::new(true),
        });
        let hooks = Arc::new(SlowSanctuaryHooks::default());
        let recorder = Arc::new(RecordingEmitter::default());
        let monitor =
            ConnectivityMonitor::new(probe, hooks.clone(), recorder.clone(), Duration::from_secs(5));
        monitor.observe(true).await;

        let going_offline = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.observe(false).await })
        };
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        let coming_back = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.observe(true).await })
        };
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        assert!(!coming_back.is_finished());
        assert_eq!(recorder.named(CONNECTIVITY_EVENT).len(), 2);

        hooks.release.notify_one();
        going_offline.await.unwrap();
        coming_back.await.unwrap();

        assert_eq!(
            *hooks.finished.lock().unwrap(),
            vec![GateView::Prompt, GateView::Sanctuary, GateView::Prompt]
        );
        let views: Vec<_> = recorder
            .named(CONNECTIVITY_EVENT)
            .iter()
            .map(|payload| payload["view"].clone())
            .collect();
        assert_eq!(views, vec!["prompt", "sanctuary", "prompt"]);
        assert_eq!(monitor.current().await.map(|t| t.view), Some(GateView::Prompt));
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_on_interval() {
        let f = fixture(true);
        let task = tokio::spawn(f.monitor.clone().run());

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(f.monitor.current().await.map(|t| t.view), Some(GateView::Prompt));

        f.probe.reachable.store(false, Ordering::SeqCst);
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            f.monitor.current().await.map(|t| t.view),
            Some(GateView::Sanctuary)
        );

        task.abort();
    }
}
