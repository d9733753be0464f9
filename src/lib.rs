mod audio;
mod breathing;
mod connectivity;
mod content;
mod db;
mod mantra;
mod quotes;
mod settings;
mod timer;
mod utils;
mod view;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use audio::{
    commands::{get_tone_state, play_tone, set_tone_volume, stop_tone},
    AudioEngineHandle,
};
use breathing::{
    commands::{get_breathing_state, set_breathing_pattern, start_breathing, stop_breathing},
    BreathingController,
};
use connectivity::{
    commands::{get_connectivity, report_connectivity},
    ConnectivityMonitor, TcpProbe,
};
use content::{ContentHooks, VerseRotator};
use db::Database;
use log::{info, warn};
use mantra::{
    commands::{get_mantra_state, increment_mantra, reset_mantra},
    MantraTally,
};
use quotes::{
    commands::{get_sanctuary_content, new_quote},
    HttpQuoteSource, QuoteService,
};
use settings::{SanctuarySettings, SettingsStore};
use tauri::{Manager, State};
use timer::{
    commands::{get_timer_state, select_timer_duration, start_timer, stop_timer},
    TimerController,
};
use view::ViewEmitter;

pub(crate) struct AppState {
    pub(crate) audio: AudioEngineHandle,
    pub(crate) breathing: BreathingController,
    pub(crate) timer: TimerController,
    pub(crate) mantra: Mutex<MantraTally>,
    pub(crate) quotes: Arc<QuoteService>,
    pub(crate) rotator: Arc<VerseRotator>,
    pub(crate) connectivity: ConnectivityMonitor,
    pub(crate) settings: SettingsStore,
}

impl AppState {
    /// Silence audio and cancel every pending timer when the window closes.
    fn teardown(&self) {
        if let Err(err) = self.audio.stop() {
            warn!("Failed to stop tone during teardown: {err}");
        }
        tauri::async_runtime::block_on(stop_widgets(
            &self.breathing,
            &self.timer,
            &self.rotator,
        ));
    }
}

/// Cancel every task the timed widgets own. Nothing is emitted afterwards.
async fn stop_widgets(
    breathing: &BreathingController,
    timer: &TimerController,
    rotator: &VerseRotator,
) {
    rotator.stop();
    breathing.stop().await;
    timer.shutdown().await;
    info!("Widgets stopped");
}

#[tauri::command]
fn get_settings(state: State<AppState>) -> Result<SanctuarySettings, String> {
    Ok(state.settings.get())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Sanctuary starting up...");

    tauri::Builder::default()
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let database = Database::new(app_data_dir.join("sanctuary.sqlite3"))?;
                let settings_store = SettingsStore::new(app_data_dir.join("settings.json"))?;
                let settings = settings_store.get();

                let emitter: Arc<dyn ViewEmitter> = Arc::new(app.handle().clone());

                let source = Arc::new(HttpQuoteSource::new(settings.quote_source_url.clone())?);
                let quotes = Arc::new(QuoteService::new(database, source));
                let rotator = Arc::new(VerseRotator::new(emitter.clone()));
                let hooks = Arc::new(ContentHooks::new(
                    quotes.clone(),
                    rotator.clone(),
                    emitter.clone(),
                ));
                let monitor = ConnectivityMonitor::new(
                    Arc::new(TcpProbe::from_settings(&settings.probe)),
                    hooks,
                    emitter.clone(),
                    Duration::from_secs(settings.probe.interval_secs),
                );

                app.manage(AppState {
                    audio: AudioEngineHandle::new(settings.initial_volume),
                    breathing: BreathingController::new(
                        emitter.clone(),
                        settings.breathing_pattern,
                    ),
                    timer: TimerController::new(emitter, settings.default_timer_minutes),
                    mantra: Mutex::new(MantraTally::new()),
                    quotes: quotes.clone(),
                    rotator,
                    connectivity: monitor.clone(),
                    settings: settings_store,
                });

                // Quotes load before the first probe so an offline start shows
                // a cached quote rather than the built-in pool.
                tauri::async_runtime::spawn(async move {
                    let count = quotes.load().await;
                    info!("{count} quotes available");
                    monitor.run().await;
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .on_window_event(|window, event| {
            if let tauri::WindowEvent::Destroyed = event {
                if let Some(state) = window.try_state::<AppState>() {
                    state.teardown();
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            get_settings,
            get_connectivity,
            report_connectivity,
            get_sanctuary_content,
            new_quote,
            get_breathing_state,
            start_breathing,
            stop_breathing,
            set_breathing_pattern,
            get_timer_state,
            select_timer_duration,
            start_timer,
            stop_timer,
            get_mantra_state,
            increment_mantra,
            reset_mantra,
            play_tone,
            stop_tone,
            set_tone_volume,
            get_tone_state,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(test)]
mod tests {
    use super::*;
    use breathing::BreathingPattern;
    use timer::TimerStatus;
    use tokio::time;
    use view::testing::RecordingEmitter;

    #[tokio::test(start_paused = true)]
    async fn teardown_silences_every_timed_widget() {
        let recorder = Arc::new(RecordingEmitter::default());
        let breathing = BreathingController::new(recorder.clone(), BreathingPattern::Box);
        let timer = TimerController::new(recorder.clone(), 5);
        let rotator = VerseRotator::new(recorder.clone());

        breathing.start().await;
        timer.start_timer().await;
        rotator.start();
        time::sleep(Duration::from_millis(5_500)).await;
        assert!(!recorder.events().is_empty());

        stop_widgets(&breathing, &timer, &rotator).await;
        recorder.clear();
        time::sleep(Duration::from_secs(600)).await;

        assert!(recorder.events().is_empty());
        assert!(!breathing.get_snapshot().await.active);
        assert_eq!(timer.get_snapshot().await.status, TimerStatus::Idle);
        assert!(!rotator.is_running());
    }

    #[test]
    fn teardown_audio_stop_is_safe_before_any_tone() {
        let audio = AudioEngineHandle::new(50.0);
        assert_eq!(audio.stop().unwrap().kind, None);
    }
}
